use super::Http;
use crate::error::{LeonardoError, Result};
use crate::models::{CreateGenerationResponse, GenerationDetails, GenerationPayload};

#[derive(Clone)]
pub struct GenerationClient {
    http: Http,
}

impl GenerationClient {
    pub fn new(http: Http) -> Self {
        Self { http }
    }

    /// Submit a generation and return the server-assigned generation id.
    pub async fn create_generation(&self, payload: &GenerationPayload) -> Result<String> {
        let response: CreateGenerationResponse =
            self.http.post_json("/generations", payload).await?;

        response
            .sd_generation_job
            .map(|job| job.generation_id)
            .ok_or_else(|| {
                LeonardoError::Remote("no generation id in submission response".into())
            })
    }

    /// Query a single generation by id.
    pub async fn get_generation(&self, generation_id: &str) -> Result<GenerationDetails> {
        self.http
            .get_json(&format!("/generations/{}", generation_id))
            .await
    }
}
