//! Bearer-token authentication for the reference grading service.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Authentication configuration loaded from the environment.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Token clients must present (from GRADER_API_TOKEN). `None` disables auth.
    pub api_token: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            api_token: std::env::var("GRADER_API_TOKEN").ok(),
        }
    }

    /// No authentication (for local development/testing).
    pub fn disabled() -> Self {
        Self { api_token: None }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            api_token: Some(token.into()),
        }
    }

    /// Check an `Authorization` header value against the configured token.
    pub fn accepts(&self, header: Option<&str>) -> bool {
        let Some(expected) = &self.api_token else {
            return true;
        };
        match header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token == expected,
            None => false,
        }
    }
}

/// Authentication middleware that checks for a valid bearer token.
pub async fn auth_middleware(
    State(config): State<AuthConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if config.accepts(auth_header) {
        Ok(next.run(request).await)
    } else {
        match auth_header {
            Some(_) => tracing::warn!("Invalid API token provided"),
            None => tracing::warn!("Missing Authorization header"),
        }
        Err(StatusCode::UNAUTHORIZED)
    }
}
