//! Retry policy for queued uploads.
//!
//! A failed item is never retried within the same processing pass; the
//! policy decides when it becomes eligible again and when it is dropped
//! as a dead letter.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff and cap policy applied between processing passes.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RetryPolicy {
    /// Base delay before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on the computed delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Maximum attempts before an item is dropped. `None` keeps the
    /// at-least-once guarantee with unbounded attempts.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: None,
        }
    }
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    300_000
}

impl RetryPolicy {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64, max_attempts: Option<u32>) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
            max_attempts,
        }
    }

    /// Delay before the given attempt (0-based) becomes eligible.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.min(20);
        let multiplier = 1_u64 << shift;
        let bounded = self
            .base_delay_ms
            .saturating_mul(multiplier)
            .min(self.max_delay_ms);
        Duration::from_millis(bounded)
    }

    /// Whether an item with the given retry count has exhausted its attempts.
    pub fn is_exhausted(&self, retry_count: u32) -> bool {
        match self.max_attempts {
            Some(cap) => retry_count >= cap,
            None => false,
        }
    }

    /// Whether an item is eligible for another attempt at `now`.
    ///
    /// Items that have never been attempted are always eligible.
    pub fn is_eligible(
        &self,
        retry_count: u32,
        last_attempt_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(last) = last_attempt_at else {
            return true;
        };
        if retry_count == 0 {
            return true;
        }
        let delay = self.delay_for_attempt(retry_count - 1);
        let delay = ChronoDuration::from_std(delay).unwrap_or(ChronoDuration::zero());
        now >= last + delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_base_delay() {
        let policy = RetryPolicy::new(250, 8_000, None);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(250));
    }

    #[test]
    fn scales_exponentially() {
        let policy = RetryPolicy::new(100, 10_000, None);
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn caps_delay_at_max() {
        let policy = RetryPolicy::new(1_000, 4_000, None);
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(4_000));
    }

    #[test]
    fn unbounded_attempts_never_exhaust() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(1_000));
    }

    #[test]
    fn capped_attempts_exhaust() {
        let policy = RetryPolicy::new(100, 1_000, Some(3));
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
    }

    #[test]
    fn fresh_items_are_eligible() {
        let policy = RetryPolicy::default();
        assert!(policy.is_eligible(0, None, Utc::now()));
    }

    #[test]
    fn recent_failure_is_not_eligible_yet() {
        let policy = RetryPolicy::new(60_000, 600_000, None);
        let now = Utc::now();
        assert!(!policy.is_eligible(1, Some(now), now));
    }

    #[test]
    fn old_failure_becomes_eligible() {
        let policy = RetryPolicy::new(1_000, 10_000, None);
        let now = Utc::now();
        let last = now - ChronoDuration::seconds(30);
        assert!(policy.is_eligible(3, Some(last), now));
    }
}
