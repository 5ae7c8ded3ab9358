//! Question sources
//!
//! A source turns the current [`Watermark`] into a batch of messages to
//! consider for posting. Sources never fail: upstream trouble is logged and
//! reported as an empty batch, optionally with an advisory delay that the
//! caller should wait out before asking again.

use async_trait::async_trait;

use crate::types::FetchOutcome;
use crate::watermark::Watermark;

pub mod stackexchange;

// Mock source is available for all builds (not just tests) to support integration tests
pub mod mock;

#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch messages for questions created since the watermark
    ///
    /// Messages come back in ascending creation order. The source only reads
    /// the watermark; moving it forward is the caller's job, using
    /// [`FetchOutcome::query_from`].
    async fn fetch(&self, watermark: &Watermark) -> FetchOutcome;

    /// Short identifier used in logs
    fn name(&self) -> &str;
}
