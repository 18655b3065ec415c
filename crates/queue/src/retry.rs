//! Retry policy.

use std::time::Duration;

/// Fixed-delay retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry enqueues before a job is dead-lettered.
    pub max_retries: u32,
    /// Delay between a failed attempt and its re-enqueue.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given bounds.
    #[must_use]
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Whether a job with this many attempts gets another try.
    #[must_use]
    pub const fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_stop_at_the_configured_bound() {
        let policy = RetryPolicy::new(3, Duration::ZERO);

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(4));
    }

    #[test]
    fn zero_retries_means_one_attempt_total() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert!(!policy.should_retry(0));
    }
}
