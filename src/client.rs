//! HTTP client for the grading service.
//!
//! Configuration is via environment variables or a [`ClientConfig`]:
//! - `GRADER_URL` - Base URL (default: `http://localhost:4010/services/grader`)
//! - `GRADER_API_TOKEN` - Bearer token (optional for local services)

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::{ClientConfig, DEFAULT_URL};
use crate::models::{Submission, SubmissionKey};

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API token required or invalid")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// HTTP client for the grading service.
#[derive(Debug, Clone)]
pub struct GradingClient {
    base_url: String,
    api_token: Option<String>,
    client: Client,
}

impl GradingClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var("GRADER_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_token = std::env::var("GRADER_API_TOKEN").ok();
        Self::new(base_url, api_token)
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_token.clone())
    }

    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional auth header.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);
        let mut req = self.client.request(method, &url);
        if let Some(ref token) = self.api_token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Map a non-success status to a [`ClientError`].
    async fn error_for(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(body),
            StatusCode::CONFLICT => ClientError::Conflict(body),
            _ => ClientError::Server(format!("{}: {}", status, body)),
        }
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_for(response).await)
        }
    }

    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String, ClientError> {
        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(Self::error_for(response).await)
        }
    }

    /// Handle response whose body is ignored.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(response).await)
        }
    }

    async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::PUT, path)
            .json(body)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    // ============================================================
    // Properties
    // ============================================================

    /// Fetch the raw grading properties payload of a submission.
    ///
    /// The body is returned as text so callers can tell transport failures
    /// apart from payloads that are not JSON or have the wrong shape.
    pub async fn get_properties(&self, key: &SubmissionKey) -> Result<String, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &key.properties_path())
            .send()
            .await?;
        self.handle_text_response(response).await
    }

    /// Replace the grading properties payload of a submission.
    pub async fn update_properties(
        &self,
        key: &SubmissionKey,
        properties: &Value,
    ) -> Result<(), ClientError> {
        self.put_json(&key.properties_path(), properties).await
    }

    // ============================================================
    // Submissions
    // ============================================================

    pub async fn get_submission(&self, key: &SubmissionKey) -> Result<Submission, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &key.submission_path())
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn update_submission(
        &self,
        key: &SubmissionKey,
        submission: &Submission,
    ) -> Result<(), ClientError> {
        self.put_json(&key.submission_path(), submission).await
    }
}
