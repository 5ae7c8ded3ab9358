//! Lower time bound for searches

/// Earliest creation time (epoch seconds) a search should cover
///
/// Starts a fixed lookback before process start and only ever moves forward.
/// A restarted process gets a fresh watermark, so after long downtime it
/// never rescans more than one lookback's worth of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    since: i64,
}

impl Watermark {
    pub fn new(since: i64) -> Self {
        Self { since }
    }

    /// Watermark for a process started at `now`
    pub fn at_start(now: i64, lookback_secs: u64) -> Self {
        Self::new(now.saturating_sub(secs_to_i64(lookback_secs)))
    }

    pub fn since(&self) -> i64 {
        self.since
    }

    /// Move forward to `instant`; earlier instants are ignored
    pub fn advance_to(&mut self, instant: i64) {
        self.since = self.since.max(instant);
    }

    /// Bound to actually search from at `now`
    ///
    /// Never earlier than `now - max_window_secs`, which caps the result
    /// volume however stale the watermark is.
    pub fn effective_from(&self, now: i64, max_window_secs: u64) -> i64 {
        now.saturating_sub(secs_to_i64(max_window_secs)).max(self.since)
    }
}

/// Config spans are `u64`; anything past `i64::MAX` just means "forever"
fn secs_to_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 24 * 60 * 60;
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_at_start_applies_lookback() {
        let watermark = Watermark::at_start(NOW, 3600);
        assert_eq!(watermark.since(), NOW - 3600);
    }

    #[test]
    fn test_ten_day_old_watermark_clamped_to_one_day() {
        let watermark = Watermark::new(NOW - 10 * DAY);
        assert_eq!(watermark.effective_from(NOW, DAY as u64), NOW - DAY);
    }

    #[test]
    fn test_recent_watermark_used_as_is() {
        let watermark = Watermark::new(NOW - 3600);
        assert_eq!(watermark.effective_from(NOW, DAY as u64), NOW - 3600);
    }

    #[test]
    fn test_huge_lookback_stays_in_the_past() {
        let watermark = Watermark::at_start(NOW, u64::MAX);
        assert!(watermark.since() < NOW);
        assert_eq!(watermark.since(), NOW.saturating_sub(i64::MAX));
    }

    #[test]
    fn test_huge_window_never_pushes_bound_forward() {
        let watermark = Watermark::new(NOW - 10 * DAY);

        let from = watermark.effective_from(NOW, u64::MAX);
        assert_eq!(from, NOW - 10 * DAY);
        assert!(from <= NOW);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut watermark = Watermark::new(NOW);

        watermark.advance_to(NOW + 10);
        assert_eq!(watermark.since(), NOW + 10);

        watermark.advance_to(NOW - 500);
        assert_eq!(watermark.since(), NOW + 10, "watermark must never move back");
    }
}
