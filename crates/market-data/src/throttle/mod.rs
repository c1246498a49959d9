//! Request pacing for market data providers.
//!
//! - Minimum spacing between outbound calls
//! - Retry policy with exponential backoff for transient failures

mod rate_limiter;
mod retry_policy;

pub use rate_limiter::{min_interval_for, RateLimiter};
pub use retry_policy::{is_retryable_status, parse_retry_after, RetryPolicy, RETRYABLE_STATUSES};
