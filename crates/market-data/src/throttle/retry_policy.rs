//! Transport retry policy.
//!
//! Exponential backoff in the style of `backoff_factor * 2^(n - 1)`: the
//! first retry goes out immediately, later retries wait 2, 4, ... seconds
//! (for a factor of 1), never longer than `backoff_max`.

use std::time::Duration;

/// HTTP statuses treated as transient.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Default number of additional attempts after the first request.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff factor in seconds.
const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;

/// Upper bound for any single backoff delay.
const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Returns true if a response with this status should be retried.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Parse a `Retry-After` header given in delta-seconds.
///
/// HTTP-date values are ignored.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Retry configuration for provider requests.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first request.
    pub max_retries: u32,
    /// Backoff factor in seconds.
    pub backoff_factor: f64,
    /// Maximum delay for a single backoff.
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            backoff_max: DEFAULT_BACKOFF_MAX,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before the given retry (1-based).
    pub fn backoff_for(&self, retry_number: u32) -> Duration {
        if retry_number <= 1 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }

        let exponent = (retry_number - 1).min(30) as i32;
        let seconds = self.backoff_factor * 2f64.powi(exponent);
        if !seconds.is_finite() || seconds >= self.backoff_max.as_secs_f64() {
            return self.backoff_max;
        }
        Duration::from_secs_f64(seconds)
    }

    /// Delay before the given retry, honoring a server-provided `Retry-After`.
    ///
    /// The larger of the computed backoff and `retry_after` wins, capped at
    /// `backoff_max`.
    pub fn delay_for(&self, retry_number: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = self.backoff_for(retry_number);
        match retry_after {
            Some(hint) => hint.max(backoff).min(self.backoff_max),
            None => backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff_factor, 1.0);
        assert_eq!(policy.backoff_max, Duration::from_secs(120));
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::ZERO);
        assert_eq!(policy.backoff_for(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(4), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            backoff_max: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_for(10), Duration::from_secs(5));
        assert_eq!(policy.backoff_for(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_factor_disables_backoff() {
        let policy = RetryPolicy {
            backoff_factor: 0.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_for(3), Duration::ZERO);
    }

    #[test]
    fn test_retry_after_wins_when_larger() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(7))),
            Duration::from_secs(7)
        );
        assert_eq!(
            policy.delay_for(3, Some(Duration::from_secs(1))),
            Duration::from_secs(4)
        );
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(600))),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            assert!(is_retryable_status(status));
        }
        for status in [200, 400, 401, 404, 501] {
            assert!(!is_retryable_status(status));
        }
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
