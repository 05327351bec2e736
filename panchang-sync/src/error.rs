//! Error types for the HTTP surface

use crate::sync::SyncError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Requested month is not in the cache (404)
    #[error("Not cached: {0}")]
    NotCached(String),

    /// A newer request replaced this one before it resolved (409)
    #[error("Request superseded")]
    Superseded,

    /// Enrichment failed for a current request (502)
    #[error("{0}")]
    SyncFailed(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// panchang-common error
    #[error("Common error: {0}")]
    Common(#[from] panchang_common::Error),
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::SyncFailed { .. } => ApiError::SyncFailed(err.to_string()),
            SyncError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            SyncError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotCached(msg) => (StatusCode::NOT_FOUND, "NOT_CACHED", msg),
            ApiError::Superseded => (
                StatusCode::CONFLICT,
                "SUPERSEDED",
                "A newer request replaced this one".to_string(),
            ),
            ApiError::SyncFailed(msg) => (StatusCode::BAD_GATEWAY, "SYNC_FAILED", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Database(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                err.to_string(),
            ),
            ApiError::Common(panchang_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
