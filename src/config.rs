//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;

use crate::client::{DEFAULT_CACHE_TTL_MS, DEFAULT_RATE_LIMIT_MS};
use crate::error::{ApiError, Result};

/// Proxy configuration parameters.
///
/// All values except the API key can be configured via environment variables
/// with sensible defaults. The API key is required: any network-backed call
/// without one must fail fast, so loading refuses to start without it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the upstream CFBD API
    pub api_key: String,
    /// Upstream API base URL
    pub base_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Minimum spacing between upstream requests in milliseconds
    pub rate_limit_ms: u64,
    /// Per-attempt upstream request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Extra attempts after the first failed one
    pub retries: u32,
    /// Default response-cache TTL in milliseconds
    pub cache_ttl_ms: u64,
    /// Expired-entry sweep interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CFBD_API_KEY` - Upstream API bearer token (required)
    /// - `CFBD_BASE_URL` - Upstream base URL (default: https://api.collegefootballdata.com)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `RATE_LIMIT_MS` - Spacing between upstream calls (default: 100)
    /// - `REQUEST_TIMEOUT_MS` - Per-attempt timeout (default: 10000)
    /// - `RETRIES` - Extra attempts after the first failure (default: 2)
    /// - `CACHE_TTL_MS` - Default response cache TTL (default: 300000)
    /// - `SWEEP_INTERVAL_SECS` - Cache sweep frequency in seconds (default: 60)
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("CFBD_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ApiError::MissingApiKey)?;

        Ok(Self {
            api_key,
            base_url: env::var("CFBD_BASE_URL")
                .unwrap_or_else(|_| "https://api.collegefootballdata.com".to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            rate_limit_ms: env::var("RATE_LIMIT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_MS),
            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            retries: env::var("RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            cache_ttl_ms: env::var("CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CACHE_TTL_MS),
            sweep_interval: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        })
    }

    /// Creates a Config with defaults and the given API key, for tests and
    /// embedded use.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.collegefootballdata.com".to_string(),
            server_port: 3000,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            request_timeout_ms: 10_000,
            retries: 2,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            sweep_interval: 60,
        }
    }
}
