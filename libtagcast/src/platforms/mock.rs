//! Mock platform implementation for testing
//!
//! A configurable platform that can simulate successes, failures and
//! latency, and records every post attempt together with the (tokio) instant
//! it was made. Designed for driving the publisher loop in tests without
//! credentials or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform name (e.g., "mock-twitter")
    pub name: String,

    /// Whether posting should succeed
    pub post_succeeds: bool,

    /// Number of initial post attempts that fail before `post_succeeds` applies
    pub fail_first: usize,

    /// Error to return on posting failure
    pub post_error: Option<String>,

    /// Delay before completing a post (simulates network latency)
    pub delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            post_succeeds: true,
            fail_first: 0,
            post_error: None,
            delay: Duration::from_millis(0),
        }
    }
}

/// One recorded call to [`Platform::post`]
#[derive(Debug, Clone)]
pub struct PostAttempt {
    pub content: String,
    pub at: Instant,
    pub succeeded: bool,
}

/// Mock platform for testing
///
/// Clones share the attempt log, so a test can keep one handle while the
/// loop owns a boxed copy.
#[derive(Clone)]
pub struct MockPlatform {
    config: MockConfig,
    attempts: Arc<Mutex<Vec<PostAttempt>>>,
}

impl MockPlatform {
    /// Create a new mock platform with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock platform that always succeeds
    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Create a mock platform that always fails posting
    pub fn post_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            post_succeeds: false,
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Create a mock platform whose first `failures` posts fail
    pub fn flaky(name: &str, failures: usize) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            fail_first: failures,
            post_error: Some("Transient mock failure".to_string()),
            ..Default::default()
        })
    }

    /// Create a mock platform with a delay
    pub fn with_delay(name: &str, delay: Duration) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            delay,
            ..Default::default()
        })
    }

    /// Every post attempt so far, successful or not
    pub fn attempts(&self) -> Vec<PostAttempt> {
        self.attempts.lock().unwrap().clone()
    }

    /// Get the number of times post has been called
    pub fn post_call_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// Content of the attempts that succeeded
    pub fn posted_content(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.succeeded)
            .map(|a| a.content.clone())
            .collect()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn post(&self, content: &str) -> Result<String> {
        let at = Instant::now();

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        let mut attempts = self.attempts.lock().unwrap();
        let succeeded = self.config.post_succeeds && attempts.len() >= self.config.fail_first;
        attempts.push(PostAttempt {
            content: content.to_string(),
            at,
            succeeded,
        });

        if succeeded {
            Ok(format!("{}:mock-{}", self.config.name, attempts.len()))
        } else {
            let error_msg = self
                .config
                .post_error
                .clone()
                .unwrap_or_else(|| "Mock posting failed".to_string());
            Err(PlatformError::Posting(error_msg).into())
        }
    }

    fn validate_content(&self, content: &str) -> Result<()> {
        if content.is_empty() {
            return Err(PlatformError::Validation("Content cannot be empty".to_string()).into());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let platform = MockPlatform::success("test");

        let post_id = platform.post("Test content").await.unwrap();
        assert_eq!(post_id, "test:mock-1");
        assert_eq!(platform.post_call_count(), 1);
        assert_eq!(platform.posted_content(), vec!["Test content"]);
    }

    #[tokio::test]
    async fn test_mock_post_failure() {
        let platform = MockPlatform::post_failure("test", "Network error");

        let result = platform.post("Test content").await;
        assert!(result.unwrap_err().to_string().contains("Network error"));
        assert_eq!(platform.post_call_count(), 1);
        assert!(platform.posted_content().is_empty());
    }

    #[tokio::test]
    async fn test_mock_flaky_recovers() {
        let platform = MockPlatform::flaky("test", 2);

        assert!(platform.post("a").await.is_err());
        assert!(platform.post("a").await.is_err());
        assert!(platform.post("a").await.is_ok());
        assert_eq!(platform.posted_content(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_with_delay() {
        let platform = MockPlatform::with_delay("test", Duration::from_millis(50));

        let start = Instant::now();
        platform.post("Test").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_mock_empty_content_validation() {
        let platform = MockPlatform::success("test");

        let result = platform.validate_content("");
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[tokio::test]
    async fn test_clones_share_attempts() {
        let platform = MockPlatform::success("test");
        let handle = platform.clone();

        let boxed: Box<dyn Platform> = Box::new(platform);
        boxed.post("shared").await.unwrap();

        assert_eq!(handle.post_call_count(), 1);
    }
}
