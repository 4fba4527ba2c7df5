use super::Http;
use crate::error::Result;
use crate::models::{CustomModelsResponse, LegacyModelsResponse, ModelInfo, PlatformModelsResponse};

#[derive(Clone)]
pub struct ModelClient {
    http: Http,
}

impl ModelClient {
    pub fn new(http: Http) -> Self {
        Self { http }
    }

    /// List available models, tolerating the vendor's evolving schema: the
    /// current `platformModels` endpoint is tried first, then the legacy
    /// `models` endpoint. Failures are downgraded to warnings and an empty
    /// list, so listing never aborts the calling command.
    pub async fn list_models(&self) -> Vec<ModelInfo> {
        match self.list_platform_models().await {
            Ok(models) => return models,
            Err(e) => {
                log::warn!("Could not fetch models from platformModels endpoint: {}", e);
            }
        }

        match self
            .http
            .get_json::<LegacyModelsResponse>("/models")
            .await
        {
            Ok(response) => response.models,
            Err(e) => {
                log::warn!("Could not fetch models from legacy endpoint: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn list_platform_models(&self) -> Result<Vec<ModelInfo>> {
        let response: PlatformModelsResponse = self.http.get_json("/platformModels").await?;
        Ok(response.platform_models)
    }

    /// User-trained models.
    pub async fn list_custom_models(&self) -> Result<Vec<ModelInfo>> {
        let response: CustomModelsResponse = self.http.get_json("/me/models").await?;
        Ok(response.loras)
    }
}
