use crate::{
    dto::auth::{LoginRequest, LoginResponse, VerifyResponse},
    error::AppResult,
};

use super::ApiClient;

impl ApiClient {
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        self.post_json(
            "/auth/login",
            &LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    /// Revalidate the currently attached bearer token.
    pub async fn verify_token(&self) -> AppResult<VerifyResponse> {
        self.post_json("/auth/verify", &serde_json::json!({})).await
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.post_empty("/auth/logout").await
    }
}
