use serde::{Deserialize, Serialize};

/// Response to GET `/me`.
#[derive(Debug, Default, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub user: Option<UserDetails>,
    #[serde(default)]
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserDetails {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(rename = "tokensRemaining", default)]
    pub tokens_remaining: Option<i64>,
    #[serde(rename = "totalTokens", default)]
    pub total_tokens: Option<i64>,
    #[serde(rename = "tokensUsed", default)]
    pub tokens_used: Option<i64>,
    #[serde(rename = "nextRenewalDate", default)]
    pub next_renewal_date: Option<String>,
}

/// Parameters for the pricing calculator, image generation service only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingParams {
    pub image_height: u32,
    pub image_width: u32,
    pub num_images: u32,
    pub inference_steps: u32,
    pub prompt_magic: bool,
    pub alchemy_mode: bool,
    pub high_resolution: bool,
    pub is_model_custom: bool,
    #[serde(rename = "isSDXL")]
    pub is_sdxl: bool,
    pub is_phoenix: bool,
}

impl PricingParams {
    pub fn image_generation(width: u32, height: u32, num_images: u32, alchemy: bool, phoenix: bool) -> Self {
        PricingParams {
            image_height: height,
            image_width: width,
            num_images,
            inference_steps: 30,
            prompt_magic: false,
            alchemy_mode: alchemy,
            high_resolution: false,
            is_model_custom: false,
            is_sdxl: false,
            is_phoenix: phoenix,
        }
    }
}

/// Request body for POST `/pricing-calculator`.
#[derive(Debug, Serialize)]
pub struct PricingRequest {
    pub service: &'static str,
    #[serde(rename = "serviceParams")]
    pub service_params: ServiceParams,
}

#[derive(Debug, Serialize)]
pub struct ServiceParams {
    #[serde(rename = "IMAGE_GENERATION")]
    pub image_generation: PricingParams,
}

impl PricingRequest {
    pub fn new(params: PricingParams) -> Self {
        PricingRequest {
            service: "IMAGE_GENERATION",
            service_params: ServiceParams {
                image_generation: params,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PricingResponse {
    #[serde(default)]
    pub cost: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_request_matches_vendor_shape() {
        let req = PricingRequest::new(PricingParams::image_generation(512, 768, 2, true, false));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["service"], "IMAGE_GENERATION");
        let params = &value["serviceParams"]["IMAGE_GENERATION"];
        assert_eq!(params["imageWidth"], 512);
        assert_eq!(params["imageHeight"], 768);
        assert_eq!(params["numImages"], 2);
        assert_eq!(params["alchemyMode"], true);
        assert_eq!(params["isSDXL"], false);
    }
}
