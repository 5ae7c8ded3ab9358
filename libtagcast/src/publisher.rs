//! Fetch, deduplicate and publish loop
//!
//! [`PublisherLoop`] owns all the state the bot has: the set of messages
//! already posted and the search watermark. Both start fresh when the loop
//! is constructed and are dropped with it, so restarting the process (or
//! rebuilding the loop after a crash) is always safe.
//!
//! One cycle runs strictly in sequence:
//!
//! 1. fetch from the source using the current watermark, then advance the
//!    watermark to the bound the source actually searched from
//! 2. wait out any advisory delay the source reported
//! 3. publish each unseen message in order, pausing `post_delay` after every
//!    attempt
//!
//! [`PublisherLoop::run`] repeats cycles forever with `poll_interval`
//! between them.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Config, DeliveryMode};
use crate::platforms::Platform;
use crate::posted::PostedSet;
use crate::sources::QuestionSource;
use crate::types::PublishableMessage;
use crate::watermark::Watermark;

/// Timing and delivery knobs for the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Pause after each publish attempt
    pub post_delay: Duration,
    /// Pause between cycles
    pub poll_interval: Duration,
    pub delivery: DeliveryMode,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            post_delay: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5 * 60),
            delivery: DeliveryMode::AtMostOnce,
        }
    }
}

impl From<&Config> for LoopSettings {
    fn from(config: &Config) -> Self {
        Self {
            post_delay: config.publish.post_delay(),
            poll_interval: config.publish.poll_interval(),
            delivery: config.publish.delivery,
        }
    }
}

/// What happened during one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Messages returned by the source
    pub fetched: usize,
    /// Messages published successfully
    pub published: usize,
    /// Publish attempts that failed
    pub failed: usize,
    /// Messages skipped because they were already posted
    pub skipped: usize,
    /// Advisory delay that was waited out before publishing
    pub waited: Option<Duration>,
}

pub struct PublisherLoop {
    source: Box<dyn QuestionSource>,
    platform: Box<dyn Platform>,
    settings: LoopSettings,
    posted: PostedSet,
    watermark: Watermark,
}

impl PublisherLoop {
    /// Create a loop with an empty posted set
    pub fn new(
        source: Box<dyn QuestionSource>,
        platform: Box<dyn Platform>,
        settings: LoopSettings,
        watermark: Watermark,
    ) -> Self {
        Self {
            source,
            platform,
            settings,
            posted: PostedSet::new(),
            watermark,
        }
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    pub fn posted(&self) -> &PostedSet {
        &self.posted
    }

    /// Run cycles forever
    pub async fn run(&mut self) {
        info!(
            "Publishing from {} to {} (post delay {:?}, poll interval {:?}, {:?})",
            self.source.name(),
            self.platform.name(),
            self.settings.post_delay,
            self.settings.poll_interval,
            self.settings.delivery
        );

        loop {
            let report = self.run_cycle().await;
            info!(
                "Cycle done: {} fetched, {} published, {} failed, {} skipped; sleeping {:?}",
                report.fetched,
                report.published,
                report.failed,
                report.skipped,
                self.settings.poll_interval
            );
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Run a single fetch-dedup-publish cycle
    pub async fn run_cycle(&mut self) -> CycleReport {
        let outcome = self.source.fetch(&self.watermark).await;
        self.watermark.advance_to(outcome.query_from);

        let mut report = CycleReport {
            fetched: outcome.messages.len(),
            waited: outcome.advisory_delay,
            ..Default::default()
        };

        if let Some(delay) = outcome.advisory_delay {
            info!("Source asked to back off, waiting {:?}", delay);
            sleep(delay).await;
        }

        for message in outcome.messages {
            if self.posted.contains(&message) {
                debug!("Already posted, skipping: {}", message);
                report.skipped += 1;
                continue;
            }

            if self.publish(message).await {
                report.published += 1;
            } else {
                report.failed += 1;
            }

            debug!("Sleeping {:?} before next post", self.settings.post_delay);
            sleep(self.settings.post_delay).await;
        }

        report
    }

    /// Publish one message and record it according to the delivery mode
    ///
    /// Returns whether the platform accepted it.
    async fn publish(&mut self, message: PublishableMessage) -> bool {
        info!("Posting: {}", message);

        let succeeded = match self.platform.post(message.as_str()).await {
            Ok(post_id) => {
                debug!("Posted to {} as {}", self.platform.name(), post_id);
                true
            }
            Err(e) => {
                warn!("Failed to post to {}: {}", self.platform.name(), e);
                false
            }
        };

        match self.settings.delivery {
            DeliveryMode::AtMostOnce => {
                self.posted.insert(message);
            }
            DeliveryMode::RetryOnFailure if succeeded => {
                self.posted.insert(message);
            }
            DeliveryMode::RetryOnFailure => {
                debug!("Leaving failed message unmarked for retry");
            }
        }

        succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::mock::MockPlatform;
    use crate::sources::mock::MockSource;
    use crate::types::FetchOutcome;
    use tokio::time::Instant;

    fn settings(delivery: DeliveryMode) -> LoopSettings {
        LoopSettings {
            delivery,
            ..Default::default()
        }
    }

    fn build(
        source: &MockSource,
        platform: &MockPlatform,
        delivery: DeliveryMode,
    ) -> PublisherLoop {
        PublisherLoop::new(
            Box::new(source.clone()),
            Box::new(platform.clone()),
            settings(delivery),
            Watermark::new(1_000),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_in_order_with_post_delay() {
        let source = MockSource::new();
        source.push_batch(&["one", "two", "three"]);
        let platform = MockPlatform::success("mock");
        let mut publisher = build(&source, &platform, DeliveryMode::AtMostOnce);

        let start = Instant::now();
        let report = publisher.run_cycle().await;

        assert_eq!(report.published, 3);
        assert_eq!(platform.posted_content(), vec!["one", "two", "three"]);

        let attempts = platform.attempts();
        for pair in attempts.windows(2) {
            assert!(pair[1].at - pair[0].at >= Duration::from_secs(10));
        }
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_within_and_across_batches_skipped() {
        let source = MockSource::new();
        source.push_batch(&["a", "b", "a"]);
        source.push_batch(&["b", "c"]);
        let platform = MockPlatform::success("mock");
        let mut publisher = build(&source, &platform, DeliveryMode::AtMostOnce);

        let first = publisher.run_cycle().await;
        let second = publisher.run_cycle().await;

        assert_eq!(first.published, 2);
        assert_eq!(first.skipped, 1);
        assert_eq!(second.published, 1);
        assert_eq!(second.skipped, 1);
        assert_eq!(platform.posted_content(), vec!["a", "b", "c"]);
        assert_eq!(publisher.posted().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_once_marks_failed_posts() {
        let source = MockSource::new();
        source.push_batch(&["x"]);
        source.push_batch(&["x"]);
        let platform = MockPlatform::post_failure("mock", "boom");
        let mut publisher = build(&source, &platform, DeliveryMode::AtMostOnce);

        let first = publisher.run_cycle().await;
        let second = publisher.run_cycle().await;

        assert_eq!(first.failed, 1);
        assert_eq!(second.skipped, 1);
        assert_eq!(platform.post_call_count(), 1, "failed post must not be retried");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_on_failure_reattempts_next_cycle() {
        let source = MockSource::new();
        source.push_batch(&["x"]);
        source.push_batch(&["x"]);
        source.push_batch(&["x"]);
        let platform = MockPlatform::flaky("mock", 1);
        let mut publisher = build(&source, &platform, DeliveryMode::RetryOnFailure);

        assert_eq!(publisher.run_cycle().await.failed, 1);
        assert_eq!(publisher.run_cycle().await.published, 1);
        assert_eq!(publisher.run_cycle().await.skipped, 1);
        assert_eq!(platform.post_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_delay_waited_before_publishing() {
        let source = MockSource::new();
        source.push(FetchOutcome {
            messages: vec![PublishableMessage::new("late")],
            advisory_delay: Some(Duration::from_secs(61)),
            query_from: 0,
        });
        let platform = MockPlatform::success("mock");
        let mut publisher = build(&source, &platform, DeliveryMode::AtMostOnce);

        let start = Instant::now();
        let report = publisher.run_cycle().await;

        assert_eq!(report.waited, Some(Duration::from_secs(61)));
        assert!(platform.attempts()[0].at - start >= Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watermark_advances_to_query_bound() {
        let source = MockSource::new();
        source.push(FetchOutcome {
            query_from: 5_000,
            ..Default::default()
        });
        source.push(FetchOutcome {
            query_from: 2_000,
            ..Default::default()
        });
        let platform = MockPlatform::success("mock");
        let mut publisher = build(&source, &platform, DeliveryMode::AtMostOnce);

        publisher.run_cycle().await;
        assert_eq!(publisher.watermark().since(), 5_000);

        publisher.run_cycle().await;
        assert_eq!(publisher.watermark().since(), 5_000);
        assert_eq!(source.watermarks(), vec![1_000, 5_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_cycle_does_not_sleep() {
        let source = MockSource::new();
        let platform = MockPlatform::success("mock");
        let mut publisher = build(&source, &platform, DeliveryMode::AtMostOnce);

        let start = Instant::now();
        let report = publisher.run_cycle().await;

        assert_eq!(report, CycleReport::default());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.publish.post_delay_secs = 3;
        config.publish.delivery = DeliveryMode::RetryOnFailure;

        let settings = LoopSettings::from(&config);
        assert_eq!(settings.post_delay, Duration::from_secs(3));
        assert_eq!(settings.poll_interval, Duration::from_secs(300));
        assert_eq!(settings.delivery, DeliveryMode::RetryOnFailure);
    }
}
