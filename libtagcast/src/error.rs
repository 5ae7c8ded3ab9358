//! Error types for Tagcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TagcastError>;

#[derive(Error, Debug)]
pub enum TagcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl TagcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TagcastError::Platform(PlatformError::Authentication(_)) => 2,
            TagcastError::Platform(_) => 1,
            TagcastError::Config(_) => 1,
            TagcastError::Fetch(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Errors raised while querying the upstream search API
///
/// These never escape the fetcher; they are logged and turned into an empty
/// result so the polling loop keeps running.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}
