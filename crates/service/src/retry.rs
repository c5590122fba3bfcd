//! Delivery retry policy.

use std::time::Duration;

/// Bounded retry with a fixed delay between attempts.
///
/// The engine persists each attempt's outcome before waiting, so the policy
/// only owns the bound and the pacing, never the persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Whether the given 1-based attempt is the final one.
    #[must_use]
    pub const fn is_last(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// 1-based attempt numbers, in order.
    pub fn attempts(&self) -> impl Iterator<Item = u32> + use<> {
        1..=self.max_attempts
    }
}

impl Default for RetryPolicy {
    /// 3 attempts, 3 seconds apart.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(3))
    }
}
