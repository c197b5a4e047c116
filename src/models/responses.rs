//! Response DTOs for the internal HTTP surface
//!
//! Defines the structure of outgoing HTTP response bodies: the `{ data, ... }`
//! envelope for list endpoints, and the introspection payloads.

use serde::Serialize;

use crate::models::records::TeamMatchup;

/// Envelope for list endpoints (games, player-stats, team-stats, teams).
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    /// The validated records
    pub data: Vec<T>,
    /// Record count, for convenience
    pub total: usize,
    /// Upstream network attempts made so far by this process
    pub request_count: u64,
}

impl<T> DataResponse<T> {
    pub fn new(data: Vec<T>, request_count: u64) -> Self {
        let total = data.len();
        Self {
            data,
            total,
            request_count,
        }
    }
}

/// Envelope for the matchup endpoint, which returns a single aggregate object.
#[derive(Debug, Clone, Serialize)]
pub struct MatchupResponse {
    pub data: TeamMatchup,
    pub request_count: u64,
}

/// Response body for the stats endpoint (GET /api/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Upstream network attempts, including retries
    pub request_count: u64,
    /// Entries currently held by the response cache
    pub cache_entries: usize,
    /// Response-cache hits
    pub hits: u64,
    /// Response-cache misses
    pub misses: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Query stores currently registered for cross-query invalidation
    pub registered_queries: usize,
}

/// Response body for the health endpoint (GET /api/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the proxy can reach upstream, "degraded" otherwise
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Whether an upstream API key is configured
    pub api_key_configured: bool,
}

impl HealthResponse {
    pub fn new(api_key_configured: bool) -> Self {
        Self {
            status: if api_key_configured {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
            api_key_configured,
        }
    }
}

/// Response body for DELETE /api/cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    pub message: String,
}

impl ClearCacheResponse {
    pub fn new() -> Self {
        Self {
            message: "API cache cleared".to_string(),
        }
    }
}

impl Default for ClearCacheResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_response_counts_records() {
        let response = DataResponse::new(vec![1, 2, 3], 7);
        assert_eq!(response.total, 3);
        assert_eq!(response.request_count, 7);
    }

    #[test]
    fn test_health_response_degraded_without_key() {
        let response = HealthResponse::new(false);
        assert_eq!(response.status, "degraded");
        assert!(!response.api_key_configured);
    }

    #[test]
    fn test_health_response_serializes_timestamp() {
        let response = HealthResponse::new(true);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
    }
}
