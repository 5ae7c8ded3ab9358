//! Platform abstraction and implementations
//!
//! A platform is the downstream service messages get published to. The
//! publisher loop only ever calls [`Platform::post`] with one message at a
//! time and never retries inside a cycle, so implementations should report
//! failures rather than retry on their own.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use libtagcast::credentials::Credentials;
//! use libtagcast::platforms::{Platform, twitter::TwitterClient};
//!
//! # async fn example() -> libtagcast::error::Result<()> {
//! let credentials = Arc::new(Credentials::new("ck", "cs", "at", "ats"));
//! let platform = TwitterClient::new(
//!     credentials,
//!     "https://api.twitter.com/1.1/statuses/update.json",
//! )?;
//!
//! let post_id = platform.post("\"Hello\" #neo4j https://stackoverflow.com/q/1").await?;
//! println!("Posted: {}", post_id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;

pub mod oauth;
pub mod twitter;

// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Platform trait for publishing messages downstream
#[async_trait]
pub trait Platform: Send + Sync {
    /// Post content to the platform
    ///
    /// Returns the platform-specific post ID.
    ///
    /// # Errors
    ///
    /// - `PlatformError::Authentication` if the credentials are rejected
    /// - `PlatformError::RateLimit` if the platform is throttling us
    /// - `PlatformError::Posting` if the post is refused for another reason
    /// - `PlatformError::Network` if the platform could not be reached
    async fn post(&self, content: &str) -> Result<String>;

    /// Check content before posting
    fn validate_content(&self, content: &str) -> Result<()>;

    /// Lowercase identifier for the platform (e.g. "twitter")
    fn name(&self) -> &str;
}
