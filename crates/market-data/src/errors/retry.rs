/// Classification for retry policy.
///
/// Used by the provider transport loop to decide whether a failed request
/// should be attempted again.
///
/// # Behavior Summary
///
/// | Class | Retried by transport? |
/// |-------|-----------------------|
/// | `Never` | No |
/// | `WithBackoff` | Yes, until the retry budget is spent |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad request, undecodable payload, or invalid config.
    /// Repeating the same request cannot produce a different answer.
    Never,

    /// Transient failure (timeouts, connection errors, 429 and 5xx gateway
    /// statuses). Retry after an exponential backoff delay.
    WithBackoff,
}
