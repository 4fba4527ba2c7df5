pub mod account_client;
pub mod generation_client;
pub mod model_client;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LeonardoError, Result};

pub use account_client::AccountClient;
pub use generation_client::GenerationClient;
pub use model_client::ModelClient;

pub const API_BASE_URL: &str = "https://cloud.leonardo.ai/api/rest/v1";

/// Shared HTTP plumbing: one reqwest client carrying the bearer token,
/// cloned into each per-concern client.
#[derive(Clone)]
pub struct Http {
    client: reqwest::Client,
    base_url: String,
}

impl Http {
    fn new(api_key: &str, base_url: String) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| LeonardoError::Config("API key contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Http { client, base_url })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        Self::parse(response).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeonardoError::Remote(format!("{}: {}", status, body)));
        }
        let parsed = response.json::<T>().await?;
        Ok(parsed)
    }
}

/// Authenticated client for the Leonardo AI REST API, split into
/// per-concern sub-clients.
#[derive(Clone)]
pub struct LeonardoClient {
    generation_client: GenerationClient,
    model_client: ModelClient,
    account_client: AccountClient,
}

impl LeonardoClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: impl Into<String>) -> Result<Self> {
        let http = Http::new(api_key, base_url.into())?;
        Ok(LeonardoClient {
            generation_client: GenerationClient::new(http.clone()),
            model_client: ModelClient::new(http.clone()),
            account_client: AccountClient::new(http),
        })
    }

    pub fn generation(&self) -> &GenerationClient {
        &self.generation_client
    }

    pub fn models(&self) -> &ModelClient {
        &self.model_client
    }

    pub fn account(&self) -> &AccountClient {
        &self.account_client
    }
}
