use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LeonardoError, Result};

pub const API_KEY_ENV: &str = "LEONARDO_API_KEY";
const DEFAULT_PROFILE: &str = "default";
const DEFAULT_OUTPUT_DIR: &str = "./leonardo-output";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub api_key: String,
}

/// On-disk shape of `~/.leonardo-cli/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// Profile store. Loaded once at startup and rewritten only by the explicit
/// configure / use-profile / delete-profile actions; the CLI process model
/// assumes no concurrent writers.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    file: ConfigFile,
}

impl ConfigStore {
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            // A corrupt config file should not brick the CLI; start fresh
            // and let the next save overwrite it.
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Could not parse {}: {}. Starting with an empty config.", path.display(), e);
                ConfigFile::default()
            })
        } else {
            ConfigFile::default()
        };

        Ok(ConfigStore { path, file })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.file)
            .map_err(|e| LeonardoError::Config(format!("could not serialize config: {}", e)))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn active_profile(&self) -> &str {
        self.file.active_profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    pub fn profiles(&self) -> impl Iterator<Item = (&String, &ProfileRecord)> {
        self.file.profiles.iter()
    }

    pub fn has_profiles(&self) -> bool {
        !self.file.profiles.is_empty()
    }

    /// Resolve the API key for the given profile (or the active one). Falls
    /// back to the `LEONARDO_API_KEY` environment variable when no persisted
    /// profile carries a key.
    pub fn api_key(&self, profile: Option<&str>) -> Option<String> {
        let name = profile.unwrap_or_else(|| self.active_profile());
        self.file
            .profiles
            .get(name)
            .map(|p| p.api_key.clone())
            .or_else(|| env::var(API_KEY_ENV).ok())
    }

    /// Store an API key under the given profile name and make it active.
    pub fn set_profile(&mut self, name: impl Into<String>, api_key: impl Into<String>) {
        let name = name.into();
        self.file.profiles.insert(
            name.clone(),
            ProfileRecord {
                api_key: api_key.into(),
            },
        );
        self.file.active_profile = Some(name);
    }

    pub fn use_profile(&mut self, name: &str) -> Result<()> {
        if !self.file.profiles.contains_key(name) {
            return Err(LeonardoError::Config(format!(
                "profile '{}' not found",
                name
            )));
        }
        self.file.active_profile = Some(name.to_string());
        Ok(())
    }

    /// Remove a profile. Deleting the active profile promotes another one,
    /// if any remain.
    pub fn delete_profile(&mut self, name: &str) -> Result<()> {
        if self.file.profiles.remove(name).is_none() {
            return Err(LeonardoError::Config(format!(
                "profile '{}' not found",
                name
            )));
        }
        if self.file.active_profile.as_deref() == Some(name) {
            self.file.active_profile = self.file.profiles.keys().next().cloned();
        }
        Ok(())
    }

    pub fn default_model(&self) -> Option<&str> {
        self.file.default_model.as_deref()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.file
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

fn default_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".leonardo-cli").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::load_from(dir.path().join("config.json")).unwrap()
    }

    #[test]
    fn round_trips_profiles() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set_profile("work", "key-1234");
        store.set_profile("personal", "key-5678");
        store.save().unwrap();

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.active_profile(), "personal");
        assert_eq!(reloaded.api_key(Some("work")).as_deref(), Some("key-1234"));
        assert_eq!(reloaded.profiles().count(), 2);
    }

    #[test]
    fn deleting_active_profile_promotes_another() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set_profile("a", "ka");
        store.set_profile("b", "kb");
        assert_eq!(store.active_profile(), "b");

        store.delete_profile("b").unwrap();
        assert_eq!(store.active_profile(), "a");

        store.delete_profile("a").unwrap();
        assert!(!store.has_profiles());
        assert!(store.delete_profile("a").is_err());
    }

    #[test]
    fn missing_file_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(!store.has_profiles());
        assert_eq!(store.active_profile(), "default");
        assert_eq!(store.output_dir(), PathBuf::from("./leonardo-output"));
    }

    #[test]
    fn corrupt_file_is_replaced_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = ConfigStore::load_from(&path).unwrap();
        assert!(!store.has_profiles());
    }
}
