//! Rate limit state for coordinated backoff.
//!
//! When the inference API returns 429, all in-flight target runs must back off
//! together instead of hammering the endpoint from every worker. This module
//! provides the shared state for that.

use std::time::{Duration, Instant};

/// Global rate limit state shared across all target runs.
#[derive(Debug)]
pub struct BackoffState {
    /// When calls may resume (None = no active limit).
    backoff_until: Option<Instant>,
    /// Number of consecutive rate limit hits.
    consecutive_hits: u32,
    /// Last successful API call time.
    last_success: Option<Instant>,
}

impl BackoffState {
    /// Create a fresh state with no active limit.
    pub fn new() -> Self {
        Self {
            backoff_until: None,
            consecutive_hits: 0,
            last_success: None,
        }
    }

    /// Check if calls are currently held back.
    pub fn is_limited(&self) -> bool {
        self.backoff_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    /// Remaining hold duration, if any.
    pub fn remaining(&self) -> Option<Duration> {
        self.backoff_until.and_then(|until| {
            let now = Instant::now();
            if now < until { Some(until - now) } else { None }
        })
    }

    /// Record a rate limit response.
    ///
    /// The delay is the maximum of the API's suggested retry-after and
    /// 2^consecutive_hits seconds, capped at 64s.
    pub fn record_rate_limit(&mut self, retry_after: Duration) {
        self.consecutive_hits += 1;

        let exp_backoff = Duration::from_secs(2u64.pow(self.consecutive_hits.min(6)));
        let delay = retry_after.max(exp_backoff);

        self.backoff_until = Some(Instant::now() + delay);

        tracing::warn!(
            retry_after_secs = delay.as_secs(),
            consecutive_hits = self.consecutive_hits,
            "Rate limited, backing off globally"
        );
    }

    /// Record a successful API call: resets the hit counter and clears the
    /// hold.
    pub fn record_success(&mut self) {
        self.consecutive_hits = 0;
        self.backoff_until = None;
        self.last_success = Some(Instant::now());
    }

    /// Time since the last successful call.
    pub fn time_since_success(&self) -> Option<Duration> {
        self.last_success.map(|t| t.elapsed())
    }
}

impl Default for BackoffState {
    fn default() -> Self {
        Self::new()
    }
}
