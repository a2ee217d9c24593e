//! Gateway-wide error taxonomy.
//!
//! One enum covers every error kind named in the system: request handling,
//! content fetching, scheduling. Each variant knows its HTTP status and a
//! stable machine-readable code, mirroring how the teacher's `CoreError`
//! and `AuthError` types carry their own `status_code()`/`code()` tables
//! rather than leaving that mapping to call sites.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("document failed validation: {0}")]
    ValidationFailed(String),

    #[error("staging content invalid: {0}")]
    ContentInvalid(String),

    #[error("network error fetching content: {0}")]
    FetchNetwork(String),

    #[error("authentication error fetching content: {0}")]
    FetchAuth(String),

    #[error("remote branch or repository not found: {0}")]
    FetchNotFound(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("an update is already in progress")]
    AlreadyInProgress,

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::ContentInvalid(_) => "CONTENT_INVALID",
            Self::FetchNetwork(_) => "FETCH_NETWORK",
            Self::FetchAuth(_) => "FETCH_AUTH",
            Self::FetchNotFound(_) => "FETCH_NOT_FOUND",
            Self::Cancelled => "CANCELLED",
            Self::AlreadyInProgress => "ALREADY_IN_PROGRESS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::ValidationFailed(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AlreadyInProgress => StatusCode::CONFLICT,
            Self::ContentInvalid(_)
            | Self::FetchNetwork(_)
            | Self::FetchAuth(_)
            | Self::FetchNotFound(_)
            | Self::Cancelled
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A failure class the scheduler treats as a user-initiated supersede
    /// rather than a genuine failure (spec.md §5: no `failedCount`
    /// increment when the cause is an abort for a newer trigger).
    pub fn is_supersede(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(GatewayError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_failed_maps_to_404_per_spec() {
        assert_eq!(
            GatewayError::ValidationFailed("bad".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(GatewayError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn cancelled_is_a_supersede_not_a_failure() {
        assert!(GatewayError::Cancelled.is_supersede());
        assert!(!GatewayError::Internal("x".into()).is_supersede());
    }

    #[test]
    fn codes_are_stable_strings() {
        assert_eq!(GatewayError::AlreadyInProgress.code(), "ALREADY_IN_PROGRESS");
        assert_eq!(GatewayError::Internal("x".into()).code(), "INTERNAL_ERROR");
    }
}
