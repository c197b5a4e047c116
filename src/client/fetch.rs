//! Retrying Fetcher Module
//!
//! Issues one logical upstream request: rate-limit gate, per-attempt timeout,
//! exponential backoff between attempts, JSON decode on success.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::client::limiter::RateLimiter;
use crate::client::transport::Transport;
use crate::error::{ApiError, Result};

/// Knobs for one logical request.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-attempt timeout; the whole retry sequence may run longer
    pub timeout: Duration,
    /// Extra attempts after the first failed one
    pub retries: u32,
    /// Backoff base; attempt `n` sleeps `2^n * base` before attempt `n + 1`
    pub backoff_base: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 2,
            backoff_base: Duration::from_secs(1),
        }
    }
}

// == Retrying Fetcher ==
/// Owns the rate limiter and the process-wide attempt counter.
pub struct RetryingFetcher {
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    request_count: AtomicU64,
}

impl RetryingFetcher {
    pub fn new(transport: Arc<dyn Transport>, min_interval: Duration) -> Self {
        Self {
            transport,
            limiter: RateLimiter::new(min_interval),
            request_count: AtomicU64::new(0),
        }
    }

    /// Upstream network attempts made so far, retries included.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Fetches and decodes one logical request.
    ///
    /// Attempts `0..=retries`; each failed attempt is logged with its number,
    /// and failure is terminal only once the budget is exhausted, at which
    /// point the last attempt's message is surfaced.
    pub async fn fetch_json(
        &self,
        url: &str,
        query: &[(String, String)],
        bearer: &str,
        options: &FetchOptions,
    ) -> Result<Value> {
        let mut last_error = String::new();

        for attempt in 0..=options.retries {
            self.limiter.acquire().await;
            self.request_count.fetch_add(1, Ordering::Relaxed);
            debug!(url, attempt = attempt + 1, "upstream request");

            match self.attempt(url, query, bearer, options.timeout).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    last_error = err.to_string();
                    warn!(url, attempt = attempt + 1, error = %last_error, "attempt failed");

                    if attempt < options.retries {
                        let delay = options.backoff_base * 2u32.pow(attempt);
                        debug!(delay_ms = delay.as_millis() as u64, "backoff before retry");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        error!(
            url,
            attempts = options.retries + 1,
            error = %last_error,
            "request failed after all attempts"
        );
        Err(ApiError::FetchFailed(last_error))
    }

    async fn attempt(
        &self,
        url: &str,
        query: &[(String, String)],
        bearer: &str,
        timeout: Duration,
    ) -> Result<Value> {
        let response = self.transport.get(url, query, bearer, timeout).await?;

        if !response.is_success() {
            return Err(ApiError::Upstream(format!(
                "API request failed: {}",
                response.status
            )));
        }

        serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Upstream(format!("invalid JSON body: {}", e)))
    }
}
