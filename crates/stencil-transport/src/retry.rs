//! Retry policy configuration and backoff timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for outbound HTTP sends.
///
/// Governs how many times a transient failure is retried and how long to
/// wait between attempts. Can be customized per transport to handle
/// different remote characteristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Honor an integer-seconds `Retry-After` header instead of computed
    /// backoff, and stamp the `Retry-Attempt` header on retried requests.
    pub use_retry_after: bool,

    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,

    /// Base delay for backoff calculation.
    pub base_delay: Duration,

    /// Exponential backoff when set; a constant `base_delay` otherwise.
    pub incremental: bool,
}

impl RetryPolicy {
    /// Fixed ceiling applied to every delay, header-supplied or computed.
    pub const MAX_DELAY: Duration = Duration::from_secs(300);

    /// Computes the wait before retry number `retry_count` (1-based).
    ///
    /// A `Retry-After` value wins over computed backoff when the policy
    /// honors it; incremental mode doubles per retry (`base * 2^count`);
    /// linear mode waits a constant `base`. The result never exceeds
    /// [`Self::MAX_DELAY`].
    pub fn delay_for(&self, retry_count: u32, retry_after: Option<u64>) -> Duration {
        let delay = match retry_after {
            Some(seconds) if self.use_retry_after => Duration::from_secs(seconds),
            _ if self.incremental => {
                let exponent = retry_count.min(20);
                self.base_delay.saturating_mul(2_u32.saturating_pow(exponent))
            },
            _ => self.base_delay,
        };

        delay.min(Self::MAX_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            use_retry_after: true,
            max_retries: 10,
            base_delay: Duration::from_secs(1),
            incremental: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_header_policy() -> RetryPolicy {
        RetryPolicy { use_retry_after: false, ..RetryPolicy::default() }
    }

    #[test]
    fn default_policy_matches_contract() {
        let policy = RetryPolicy::default();
        assert!(policy.use_retry_after);
        assert_eq!(policy.max_retries, 10);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert!(policy.incremental);
    }

    #[test]
    fn incremental_delay_doubles_per_retry() {
        let policy = no_header_policy();

        let delays =
            (1..=5).map(|count| policy.delay_for(count, None)).collect::<Vec<_>>();

        assert_eq!(delays[0], Duration::from_secs(2));
        assert_eq!(delays[1], Duration::from_secs(4));
        assert_eq!(delays[2], Duration::from_secs(8));
        assert_eq!(delays[3], Duration::from_secs(16));
        assert_eq!(delays[4], Duration::from_secs(32));
    }

    #[test]
    fn linear_delay_stays_constant() {
        let policy = RetryPolicy {
            incremental: false,
            base_delay: Duration::from_secs(5),
            ..no_header_policy()
        };

        for count in 1..=5 {
            assert_eq!(policy.delay_for(count, None), Duration::from_secs(5));
        }
    }

    #[test]
    fn computed_delay_is_capped() {
        let policy = no_header_policy();

        // 2^10 seconds would be 1024s; the ceiling wins.
        assert_eq!(policy.delay_for(10, None), RetryPolicy::MAX_DELAY);
        assert_eq!(policy.delay_for(u32::MAX, None), RetryPolicy::MAX_DELAY);
    }

    #[test]
    fn retry_after_overrides_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(1, Some(42)), Duration::from_secs(42));
        // Without a header the same retry falls back to computed backoff.
        assert_eq!(policy.delay_for(1, None), Duration::from_secs(2));
    }

    #[test]
    fn retry_after_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1, Some(3600)), RetryPolicy::MAX_DELAY);
    }

    #[test]
    fn retry_after_ignored_when_disabled() {
        let policy = no_header_policy();
        assert_eq!(policy.delay_for(1, Some(42)), Duration::from_secs(2));
    }
}
