//! Twitter platform implementation
//!
//! Posts status updates through the v1.1 `statuses/update` endpoint,
//! authenticated with OAuth 1.0a user credentials.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

use crate::credentials::Credentials;
use crate::error::{PlatformError, Result};
use crate::platforms::{oauth, Platform};

/// Twitter platform client
pub struct TwitterClient {
    client: reqwest::Client,
    endpoint: String,
    credentials: Arc<Credentials>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    id_str: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i64,
    message: String,
}

impl TwitterClient {
    /// Create a client posting to `endpoint`
    pub fn new(credentials: Arc<Credentials>, endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tagcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        })
    }
}

#[async_trait]
impl Platform for TwitterClient {
    async fn post(&self, content: &str) -> Result<String> {
        self.validate_content(content)?;

        let authorization = oauth::authorization_header(
            &self.credentials,
            "POST",
            &self.endpoint,
            &[("status", content)],
        )?;
        let body = format!("status={}", oauth::percent_encode(content));

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| PlatformError::Network(format!("Twitter request failed: {}", e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            PlatformError::Network(format!("Failed to read Twitter response: {}", e))
        })?;

        if !status.is_success() {
            return Err(map_status_error(status, &text).into());
        }

        let parsed: StatusResponse = serde_json::from_str(&text).map_err(|e| {
            PlatformError::Posting(format!("Unexpected Twitter response: {}", e))
        })?;

        Ok(parsed.id_str)
    }

    fn validate_content(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(PlatformError::Validation("Content cannot be empty".to_string()).into());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "twitter"
    }
}

/// Map a non-success response to a platform error
fn map_status_error(status: StatusCode, body: &str) -> PlatformError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .filter(|r| !r.errors.is_empty())
        .map(|r| {
            r.errors
                .iter()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_else(|| format!("HTTP {}", status));

    match status {
        StatusCode::UNAUTHORIZED => PlatformError::Authentication(detail),
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimit(detail),
        // 403 covers both bad app permissions and content refusals such as
        // duplicate statuses, so it is not treated as an auth failure.
        _ => PlatformError::Posting(detail),
    }
}
