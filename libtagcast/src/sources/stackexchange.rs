//! Stack Exchange search API source
//!
//! Issues one `GET /search` per round, ordered by ascending creation time,
//! and renders each returned question with [`format_message`]. Quota
//! signals from the API are turned into an advisory delay instead of being
//! slept on here, so the caller decides when to wait.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::{FetchError, Result};
use crate::message::format_message;
use crate::sources::QuestionSource;
use crate::types::{FetchOutcome, SearchResponse};
use crate::watermark::Watermark;

/// `error_name` the API uses when a client exceeds its request quota
pub const THROTTLE_VIOLATION: &str = "throttle_violation";

pub struct StackExchangeSource {
    client: reqwest::Client,
    config: SearchConfig,
}

impl StackExchangeSource {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("tagcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Fetch as of a given `now`, in epoch seconds
    pub async fn fetch_at(&self, watermark: &Watermark, now: i64) -> FetchOutcome {
        let query_from = watermark.effective_from(now, self.config.max_window_secs);

        match self.search(query_from).await {
            Ok(response) => self.outcome_from_response(response, query_from),
            Err(e) => {
                warn!("Search request failed, treating as empty: {}", e);
                FetchOutcome::empty(query_from)
            }
        }
    }

    async fn search(&self, query_from: i64) -> std::result::Result<SearchResponse, FetchError> {
        let tagged = self.config.tags.join(";");
        let from = query_from.to_string();
        let params = [
            ("fromdate", from.as_str()),
            ("order", "asc"),
            ("sort", "creation"),
            ("tagged", tagged.as_str()),
            ("site", self.config.site.as_str()),
        ];

        debug!(
            "GET {} fromdate={} tagged={} site={}",
            self.config.endpoint, from, tagged, self.config.site
        );

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        // Throttling comes back as a 4xx with the usual JSON envelope, so
        // the body is decoded whatever the status.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            debug!("Search returned HTTP {}", status);
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Turn a decoded response into messages plus any requested wait
    pub fn outcome_from_response(&self, response: SearchResponse, query_from: i64) -> FetchOutcome {
        let advisory_delay = self.advisory_delay(&response);

        let messages: Vec<_> = response
            .items
            .iter()
            .map(|item| format_message(item, &self.config.hashtag))
            .collect();

        debug!("Search from {} returned {} item(s)", query_from, messages.len());

        FetchOutcome {
            messages,
            advisory_delay,
            query_from,
        }
    }

    fn advisory_delay(&self, response: &SearchResponse) -> Option<Duration> {
        let mut wait_secs = 0u64;

        if response.items.is_empty() {
            if let Some(name) = &response.error_name {
                warn!(
                    "Search returned no items and error {}: {}",
                    name,
                    response.error_message.as_deref().unwrap_or("")
                );
            }

            if response.error_name.as_deref() == Some(THROTTLE_VIOLATION) {
                let message = response.error_message.as_deref().unwrap_or("");
                match parse_throttle_wait(message) {
                    Some(secs) if secs < self.config.throttle_ceiling_secs => {
                        info!("Throttled by search API, requesting {}s wait", secs);
                        wait_secs = wait_secs.saturating_add(secs.saturating_add(1));
                    }
                    Some(secs) => {
                        warn!("Ignoring implausible throttle wait of {}s", secs);
                    }
                    None => {
                        warn!("Could not parse throttle wait from {:?}", message);
                    }
                }
            }
        }

        // `backoff` is upstream-supplied, so it may be anything a u64 holds
        if let Some(backoff) = response.backoff.filter(|b| *b > 0) {
            info!("Backoff set by search API, requesting {}s wait", backoff);
            wait_secs = wait_secs.saturating_add(backoff.saturating_add(1));
        }

        (wait_secs > 0).then(|| Duration::from_secs(wait_secs))
    }
}

#[async_trait]
impl QuestionSource for StackExchangeSource {
    async fn fetch(&self, watermark: &Watermark) -> FetchOutcome {
        self.fetch_at(watermark, chrono::Utc::now().timestamp()).await
    }

    fn name(&self) -> &str {
        "stackexchange"
    }
}

/// Extract the wait from a throttle message
///
/// The API phrases it as `"... more requests available in 76366 seconds"`;
/// only the last two tokens are looked at.
pub fn parse_throttle_wait(message: &str) -> Option<u64> {
    let mut tokens = message.split_whitespace().rev();
    let unit = tokens.next()?.trim_end_matches('.');
    let amount = tokens.next()?;

    if unit != "seconds" && unit != "second" {
        return None;
    }

    amount.parse().ok()
}
