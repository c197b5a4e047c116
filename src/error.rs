//! Error types for the proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Api Error Enum ==
/// Unified error type for the client, query layer, and HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// CFBD_API_KEY is not configured; raised before any network attempt
    #[error("CFBD API key is not configured (set CFBD_API_KEY)")]
    MissingApiKey,

    /// A required endpoint parameter is absent
    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    /// Request data failed client-side validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A single attempt failed (timeout, transport error, non-2xx); retried
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// The retry budget is exhausted; carries the last attempt's message
    #[error("Failed to fetch data: {0}")]
    FetchFailed(String),

    /// Response body could not be decoded into the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A query store fetch failed after its own retry budget
    #[error("Query '{key}' failed: {message}")]
    Query { key: String, message: String },
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingParam(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingApiKey
            | ApiError::Upstream(_)
            | ApiError::FetchFailed(_)
            | ApiError::InvalidPayload(_)
            | ApiError::Query { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ApiError>;
