use super::Http;
use crate::error::Result;
use crate::models::{PricingParams, PricingRequest, PricingResponse, UserResponse};

#[derive(Clone)]
pub struct AccountClient {
    http: Http,
}

impl AccountClient {
    pub fn new(http: Http) -> Self {
        Self { http }
    }

    /// Account and subscription details for the authenticated user.
    pub async fn get_user_info(&self) -> Result<UserResponse> {
        self.http.get_json("/me").await
    }

    /// Ask the vendor to price an image generation before running it.
    pub async fn calculate_pricing(&self, params: PricingParams) -> Result<PricingResponse> {
        self.http
            .post_json("/pricing-calculator", &PricingRequest::new(params))
            .await
    }
}
