//! Bounded exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Retry policy for replica fetches: exponential backoff with jitter,
/// bounded by a maximum attempt count.
///
/// Only reads are retried under this policy. Writes are never retried by
/// this layer — a retried non-idempotent submission can create duplicate
/// log entries, so that decision stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Must be at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each subsequent retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay, applied before jitter.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep before retry number `attempt` (1-based: the delay
    /// after the first failure is `delay_for(1)`).
    ///
    /// Exponential doubling capped at `max_delay`, then jittered into
    /// `[50%, 100%]` of the capped value.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(16);
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(doublings));
        let capped = exponential.min(self.max_delay);
        let factor = rand::thread_rng().gen_range(0.5..=1.0);
        capped.mul_f64(factor)
    }
}
