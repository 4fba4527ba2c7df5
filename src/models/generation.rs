use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LeonardoError, Result};

/// Vendor-owned constants, current as of the v1 REST API. These are external
/// versioned facts, not design choices of this client.
pub const PHOENIX_MODEL_ID: &str = "6b645e3a-d64f-4341-a6d8-7a3690fbf042";
pub const VALID_CONTRASTS: [f32; 8] = [1.0, 1.3, 1.8, 2.5, 3.0, 3.5, 4.0, 4.5];
pub const DEFAULT_PHOENIX_CONTRAST: f32 = 3.5;
/// Alchemy requires a contrast of at least 2.5 on Phoenix.
pub const MIN_ALCHEMY_CONTRAST: f32 = 2.5;

pub const MIN_DIMENSION: u32 = 512;
pub const MAX_DIMENSION: u32 = 1536;

/// The generations endpoint accepts dimensions in multiples of 8 within the
/// documented range.
pub fn is_supported_dimension(value: u32) -> bool {
    (MIN_DIMENSION..=MAX_DIMENSION).contains(&value) && value % 8 == 0
}

/// A single image generation request as assembled from CLI flags, before it
/// is turned into the provider-specific payload.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model_id: Option<String>,
    pub num_images: u32,
    pub width: u32,
    pub height: u32,
    pub negative_prompt: Option<String>,
    pub guidance_scale: Option<f32>,
    pub preset_style: Option<String>,
    pub alchemy: bool,
    pub photoreal: bool,
    pub photoreal_version: Option<String>,
    pub phoenix: bool,
    pub contrast: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        GenerationRequest {
            prompt: prompt.into(),
            model_id: None,
            num_images: 1,
            width: 512,
            height: 512,
            negative_prompt: None,
            guidance_scale: None,
            preset_style: None,
            alchemy: false,
            photoreal: false,
            photoreal_version: None,
            phoenix: false,
            contrast: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_phoenix(mut self, contrast: Option<f32>) -> Self {
        self.phoenix = true;
        self.contrast = contrast;
        self
    }

    /// Check user-supplied constraints. Always runs before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(LeonardoError::validation("prompt", "must not be empty"));
        }
        if !is_supported_dimension(self.width) {
            return Err(LeonardoError::validation(
                "width",
                format!(
                    "{} is not supported; use a multiple of 8 between {} and {}",
                    self.width, MIN_DIMENSION, MAX_DIMENSION
                ),
            ));
        }
        if !is_supported_dimension(self.height) {
            return Err(LeonardoError::validation(
                "height",
                format!(
                    "{} is not supported; use a multiple of 8 between {} and {}",
                    self.height, MIN_DIMENSION, MAX_DIMENSION
                ),
            ));
        }
        if self.num_images == 0 {
            return Err(LeonardoError::validation("num", "must be at least 1"));
        }
        if self.contrast.is_some() && !self.phoenix {
            return Err(LeonardoError::validation(
                "contrast",
                "only meaningful together with --phoenix",
            ));
        }
        Ok(())
    }

    /// Contrast as actually submitted for a Phoenix generation: defaulted,
    /// raised to the Alchemy minimum, then snapped to the vendor's grid.
    pub fn effective_contrast(&self) -> f32 {
        let mut contrast = self.contrast.unwrap_or(DEFAULT_PHOENIX_CONTRAST);
        if self.alchemy && contrast < MIN_ALCHEMY_CONTRAST {
            log::warn!(
                "Phoenix with Alchemy needs contrast >= {}; raising {} to {}",
                MIN_ALCHEMY_CONTRAST,
                contrast,
                MIN_ALCHEMY_CONTRAST
            );
            contrast = MIN_ALCHEMY_CONTRAST;
        }
        let mut nearest = VALID_CONTRASTS[0];
        for candidate in VALID_CONTRASTS {
            if (candidate - contrast).abs() < (nearest - contrast).abs() {
                nearest = candidate;
            }
        }
        if (nearest - contrast).abs() > f32::EPSILON {
            log::warn!(
                "Contrast {} is not valid for Phoenix; using nearest value {}",
                contrast,
                nearest
            );
        }
        nearest
    }

    /// Build the provider payload. Phoenix and PhotoReal fields are mutually
    /// exclusive: enabling Phoenix strips PhotoReal fields and vice versa.
    pub fn payload(&self) -> GenerationPayload {
        let mut payload = GenerationPayload {
            prompt: self.prompt.clone(),
            width: self.width,
            height: self.height,
            num_images: self.num_images,
            model_id: self.model_id.clone(),
            negative_prompt: self.negative_prompt.clone(),
            guidance_scale: self.guidance_scale,
            preset_style: self.preset_style.clone(),
            alchemy: self.alchemy.then_some(true),
            photo_real: None,
            photo_real_version: None,
            is_phoenix: None,
            contrast: None,
        };

        if self.phoenix {
            payload.model_id = Some(PHOENIX_MODEL_ID.to_string());
            payload.is_phoenix = Some(true);
            payload.contrast = Some(self.effective_contrast());
        } else if self.photoreal {
            payload.photo_real = Some(true);
            payload.photo_real_version = self.photoreal_version.clone();
        }

        payload
    }
}

/// Wire shape POSTed to `/generations`. Field names are the vendor's
/// contract, a mix of snake_case and camelCase.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationPayload {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_images: u32,
    #[serde(rename = "modelId", skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
    #[serde(rename = "presetStyle", skip_serializing_if = "Option::is_none")]
    pub preset_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alchemy: Option<bool>,
    #[serde(rename = "photoReal", skip_serializing_if = "Option::is_none")]
    pub photo_real: Option<bool>,
    #[serde(rename = "photoRealVersion", skip_serializing_if = "Option::is_none")]
    pub photo_real_version: Option<String>,
    #[serde(rename = "isPhoenix", skip_serializing_if = "Option::is_none")]
    pub is_phoenix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Complete,
    Failed,
}

impl JobStatus {
    /// The server reports status as a free-form string; anything that is not
    /// a known terminal status counts as still pending.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "COMPLETE" => JobStatus::Complete,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Complete => write!(f, "COMPLETE"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Why a job ended up FAILED: the server said so, or we stopped waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Server(String),
    TimedOut { seconds: u64 },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Server(msg) => write!(f, "server reported failure: {}", msg),
            FailureReason::TimedOut { seconds } => write!(f, "timed out after {}s", seconds),
        }
    }
}

/// A generation job tracked by its server-assigned id. Created on successful
/// submission, mutated only by polling, terminal at COMPLETE or FAILED.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: String,
    pub status: JobStatus,
    pub result_urls: Vec<String>,
    pub failure: Option<FailureReason>,
}

impl GenerationJob {
    pub fn pending(id: impl Into<String>) -> Self {
        GenerationJob {
            id: id.into(),
            status: JobStatus::Pending,
            result_urls: Vec::new(),
            failure: None,
        }
    }

    pub fn complete(id: impl Into<String>, result_urls: Vec<String>) -> Self {
        GenerationJob {
            id: id.into(),
            status: JobStatus::Complete,
            result_urls,
            failure: None,
        }
    }

    pub fn failed(id: impl Into<String>, reason: FailureReason) -> Self {
        GenerationJob {
            id: id.into(),
            status: JobStatus::Failed,
            result_urls: Vec::new(),
            failure: Some(reason),
        }
    }
}

/// Response to POST `/generations`.
#[derive(Debug, Deserialize)]
pub struct CreateGenerationResponse {
    #[serde(rename = "sdGenerationJob")]
    pub sd_generation_job: Option<SdGenerationJob>,
}

#[derive(Debug, Deserialize)]
pub struct SdGenerationJob {
    #[serde(rename = "generationId")]
    pub generation_id: String,
}

/// Response to GET `/generations/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerationDetails {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub generations: Vec<GeneratedImage>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedImage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_dimensions() {
        for (w, h) in [(512, 512), (768, 1024), (1536, 512), (832, 1216)] {
            let req = GenerationRequest::new("a sunset").with_size(w, h);
            assert!(req.validate().is_ok(), "{}x{} should validate", w, h);
        }
    }

    #[test]
    fn rejects_unsupported_dimensions() {
        for (w, h) in [(500, 512), (512, 2048), (0, 512), (513, 512)] {
            let req = GenerationRequest::new("a sunset").with_size(w, h);
            let err = req.validate().unwrap_err();
            assert!(
                matches!(err, LeonardoError::Validation { field, .. } if field == "width" || field == "height"),
                "{}x{} should be rejected with a dimension error",
                w,
                h
            );
        }
    }

    #[test]
    fn rejects_empty_prompt() {
        let err = GenerationRequest::new("   ").validate().unwrap_err();
        assert!(matches!(err, LeonardoError::Validation { field: "prompt", .. }));
    }

    #[test]
    fn rejects_contrast_without_phoenix() {
        let mut req = GenerationRequest::new("a sunset");
        req.contrast = Some(3.0);
        let err = req.validate().unwrap_err();
        assert!(matches!(err, LeonardoError::Validation { field: "contrast", .. }));
    }

    #[test]
    fn phoenix_payload_excludes_photoreal_fields() {
        let mut req = GenerationRequest::new("a sunset").with_phoenix(Some(3.0));
        req.photoreal = true;
        req.photoreal_version = Some("v2".to_string());

        let value = serde_json::to_value(req.payload()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["isPhoenix"], true);
        assert_eq!(obj["contrast"], 3.0);
        assert_eq!(obj["modelId"], PHOENIX_MODEL_ID);
        assert!(!obj.contains_key("photoReal"));
        assert!(!obj.contains_key("photoRealVersion"));
    }

    #[test]
    fn photoreal_payload_excludes_phoenix_fields() {
        let mut req = GenerationRequest::new("a sunset");
        req.photoreal = true;
        req.photoreal_version = Some("v2".to_string());

        let value = serde_json::to_value(req.payload()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["photoReal"], true);
        assert_eq!(obj["photoRealVersion"], "v2");
        assert!(!obj.contains_key("isPhoenix"));
        assert!(!obj.contains_key("contrast"));
    }

    #[test]
    fn contrast_is_snapped_and_raised_for_alchemy() {
        let mut req = GenerationRequest::new("a sunset").with_phoenix(Some(1.0));
        req.alchemy = true;
        assert_eq!(req.effective_contrast(), MIN_ALCHEMY_CONTRAST);

        let req = GenerationRequest::new("a sunset").with_phoenix(Some(3.2));
        assert_eq!(req.effective_contrast(), 3.0);

        let req = GenerationRequest::new("a sunset").with_phoenix(None);
        assert_eq!(req.effective_contrast(), DEFAULT_PHOENIX_CONTRAST);
    }

    #[test]
    fn status_parses_from_wire() {
        assert_eq!(JobStatus::from_wire("COMPLETE"), JobStatus::Complete);
        assert_eq!(JobStatus::from_wire("FAILED"), JobStatus::Failed);
        assert_eq!(JobStatus::from_wire("PENDING"), JobStatus::Pending);
        assert_eq!(JobStatus::from_wire("SOMETHING_NEW"), JobStatus::Pending);
    }
}
