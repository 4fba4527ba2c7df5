use serde::Deserialize;

/// One entry from any of the model-listing endpoints. The vendor's schemas
/// differ per endpoint, so everything beyond the id is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response to GET `/platformModels`.
#[derive(Debug, Default, Deserialize)]
pub struct PlatformModelsResponse {
    #[serde(rename = "platformModels", default)]
    pub platform_models: Vec<ModelInfo>,
}

/// Response to the legacy GET `/models` endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct LegacyModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Response to GET `/me/models` (user-trained models).
#[derive(Debug, Default, Deserialize)]
pub struct CustomModelsResponse {
    #[serde(default)]
    pub loras: Vec<ModelInfo>,
}
