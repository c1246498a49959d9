//! Minimum-spacing rate limiter for market data providers.
//!
//! A leaky bucket of one: every acquisition must happen at least
//! `min_interval` after the previous one. This bounds the request rate but
//! does not smooth a burst that follows an idle period shorter than one
//! interval.

use std::time::{Duration, Instant};

use log::debug;
use tokio::sync::Mutex;

/// Returns the minimum spacing between requests for a per-minute budget.
///
/// `None` for a zero budget, which cannot be honored.
pub fn min_interval_for(requests_per_minute: u32) -> Option<Duration> {
    if requests_per_minute == 0 {
        return None;
    }
    Some(Duration::from_secs_f64(60.0 / requests_per_minute as f64))
}

/// Thread-safe limiter enforcing a fixed minimum spacing between requests.
///
/// Callers that arrive too early wait (asynchronously) for the remainder of
/// the interval. Concurrent callers queue on the inner lock, so they are
/// released one interval apart.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum time between two acquisitions.
    min_interval: Duration,
    /// Time of the last successful acquisition.
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum spacing.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Minimum spacing enforced by this limiter.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may be sent, then record it.
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&self) -> Duration {
        let mut last = self.last_request.lock().await;

        let wait_time = (*last)
            .map(|prev| self.min_interval.saturating_sub(prev.elapsed()))
            .unwrap_or(Duration::ZERO);

        if wait_time > Duration::ZERO {
            debug!("Rate limiter: waiting {:?} before next request", wait_time);
            tokio::time::sleep(wait_time).await;
        }

        *last = Some(Instant::now());
        wait_time
    }

    /// Try to acquire without waiting.
    ///
    /// Returns true if the request may be sent now (and records it), false if
    /// the spacing has not elapsed yet or another caller holds the limiter.
    pub fn try_acquire(&self) -> bool {
        let Ok(mut last) = self.last_request.try_lock() else {
            return false;
        };

        match *last {
            Some(prev) if prev.elapsed() < self.min_interval => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }

    /// Time remaining before the next request may be sent.
    pub async fn time_until_available(&self) -> Duration {
        let last = self.last_request.lock().await;
        (*last)
            .map(|prev| self.min_interval.saturating_sub(prev.elapsed()))
            .unwrap_or(Duration::ZERO)
    }

    /// Forget the last request so the next acquisition is immediate.
    pub async fn reset(&self) {
        *self.last_request.lock().await = None;
    }
}
