//! Error types for wdg-ingest

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use wdg_common::headers::{HeaderError, AUTHORIZATION};
use wdg_common::srn::SrnError;
use wdg_common::upstream::UpstreamError;

use crate::submit::SubmitError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Authentication precondition not met (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upstream ingestion backend failure (502)
    #[error("Ingestion backend failure: {0}")]
    Upstream(#[from] UpstreamError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<HeaderError> for ApiError {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::Missing(AUTHORIZATION) => ApiError::Unauthorized(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<SrnError> for ApiError {
    fn from(err: SrnError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Srn(e) => ApiError::BadRequest(e.to_string()),
            SubmitError::LandingZone { .. } => ApiError::Internal(err.to_string()),
            SubmitError::Submission(e) => ApiError::Upstream(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Upstream(ref err) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string())
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
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
