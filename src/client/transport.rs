//! Transport Module
//!
//! The seam between request orchestration and the actual HTTP stack. The
//! fetcher talks to a [`Transport`] so retry, timeout, and caching behavior
//! can be exercised against scripted transports in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ApiError, Result};

// == Transport Response ==
/// Raw result of one HTTP attempt.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// == Transport Trait ==
/// One GET against the upstream API.
///
/// Implementations must enforce the timeout themselves and cancel in-flight
/// work past it; the fetcher treats a timeout like any other failed attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        bearer: &str,
        timeout: Duration,
    ) -> Result<TransportResponse>;
}

// == HTTP Transport ==
/// Production transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        bearer: &str,
        timeout: Duration,
    ) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(bearer)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Upstream(format!("request timed out after {:?}", timeout))
                } else {
                    ApiError::Upstream(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}
