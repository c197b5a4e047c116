//! Rate Limiter Module
//!
//! Enforces minimum spacing between upstream requests.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

// == Rate Limiter ==
/// Spaces upstream calls by a minimum interval.
///
/// The last-issue timestamp lives behind a `tokio::sync::Mutex` that is held
/// across the spacing sleep, so concurrent callers queue up and each gets a
/// deterministic slot. The timestamp is updated at the moment a caller is
/// released to issue its request, not when the request returns.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// caller was released, then records the new issue time.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "rate limit wait");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}
