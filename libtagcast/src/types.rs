//! Core types for Tagcast

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A question as returned by the search API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub title: String,
    pub link: String,
}

/// Envelope returned by the Stack Exchange search endpoint
///
/// Error responses reuse the same envelope with no items, e.g.
/// `{"error_id":502,"error_name":"throttle_violation","error_message":"..."}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<CandidateItem>,
    #[serde(default)]
    pub backoff: Option<u64>,
    #[serde(default)]
    pub error_id: Option<i64>,
    #[serde(default)]
    pub error_name: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// The text posted downstream for one question
///
/// Doubles as the deduplication key, so two items only count as the same
/// post when they render to the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublishableMessage(String);

impl PublishableMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PublishableMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PublishableMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of one search round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Messages in ascending creation order
    pub messages: Vec<PublishableMessage>,
    /// How long the upstream asked us to wait before the next request
    pub advisory_delay: Option<Duration>,
    /// Lower time bound the search was issued with (epoch seconds)
    pub query_from: i64,
}

impl FetchOutcome {
    /// An empty round that still reports the bound it searched from
    pub fn empty(query_from: i64) -> Self {
        Self {
            query_from,
            ..Default::default()
        }
    }
}
