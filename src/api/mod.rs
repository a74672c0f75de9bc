use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

mod auth;
mod catalog;
mod orders;
mod payment;

/// HTTP client for the remote POS backend. One instance per process; the
/// bearer token is attached to admin-only calls when present.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http,
            token: None,
        })
    }

    pub fn set_bearer_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self.request(Method::GET, path).send().await?;
        decode(check_status(response).await?).await
    }

    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        decode(check_status(response).await?).await
    }

    pub(crate) async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        decode(check_status(response).await?).await
    }

    pub(crate) async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self.request(Method::PUT, path).send().await?;
        decode(check_status(response).await?).await
    }

    pub(crate) async fn post_empty(&self, path: &str) -> AppResult<()> {
        let response = self.request(Method::POST, path).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error: String,
}

/// Map a non-2xx response to a typed error, preferring the backend's own
/// `message`/`error` body when it parses.
async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ApiErrorBody>().await {
        Ok(body) if !body.message.is_empty() => body.message,
        Ok(body) if !body.error.is_empty() => body.error,
        _ => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };

    tracing::debug!(status = %status, message = %message, "backend request failed");

    match status {
        StatusCode::NOT_FOUND => Err(AppError::NotFound),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Unauthorized),
        _ => Err(AppError::Api {
            status: status.as_u16(),
            message,
        }),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    response.json::<T>().await.map_err(AppError::Decode)
}
