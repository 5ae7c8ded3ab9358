//! Mock source for testing
//!
//! Replays a scripted sequence of fetch outcomes and records the watermark
//! each fetch was called with. Once the script runs out every fetch returns
//! an empty batch.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::sources::QuestionSource;
use crate::types::{FetchOutcome, PublishableMessage};
use crate::watermark::Watermark;

/// Mock question source
///
/// Clones share the same script and call log, so a test can keep one
/// handle and box the other into a publisher loop.
#[derive(Clone, Default)]
pub struct MockSource {
    script: Arc<Mutex<VecDeque<FetchOutcome>>>,
    watermarks: Arc<Mutex<Vec<i64>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a round returning the given messages with no delay
    pub fn push_batch(&self, messages: &[&str]) {
        self.push(FetchOutcome {
            messages: messages.iter().map(|m| PublishableMessage::new(*m)).collect(),
            ..Default::default()
        });
    }

    pub fn push(&self, outcome: FetchOutcome) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// Watermarks (`since` values) passed to each fetch so far
    pub fn watermarks(&self) -> Vec<i64> {
        self.watermarks.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.watermarks.lock().unwrap().len()
    }
}

#[async_trait]
impl QuestionSource for MockSource {
    async fn fetch(&self, watermark: &Watermark) -> FetchOutcome {
        self.watermarks.lock().unwrap().push(watermark.since());

        let mut outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| FetchOutcome::empty(watermark.since()));

        if outcome.query_from == 0 {
            outcome.query_from = watermark.since();
        }
        outcome
    }

    fn name(&self) -> &str {
        "mock"
    }
}
