//! Error types for the Depot API.
//!
//! ```text
//! DbError::PermissionDenied                          → 403
//! DbError::NotFound                                  → 404
//! Domain / InsufficientStock / constraint violations → 400
//! anything else                                      → 500 (logged, generic body)
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use depot_core::{CoreError, ValidationError};
use depot_db::DbError;
use serde::Serialize;
use tracing::{error, warn};

/// Depot API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No identity, or a token that does not verify.
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    /// Identity resolved but its role maps to no pool, or the store refused.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed request or a rule the request breaks.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Detail is logged, never sent.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal",
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Internal(detail) => {
                error!(error = %detail, "Internal error occurred");
                "Internal server error".to_string()
            }
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::PermissionDenied(detail) => {
                warn!(%detail, "Store refused statement for this role");
                ApiError::Forbidden("Access denied".to_string())
            }
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::InsufficientStock(_) => {
                ApiError::InvalidRequest("Insufficient product quantity".to_string())
            }
            DbError::Domain(core) => core.into(),
            DbError::UniqueViolation { .. }
            | DbError::ForeignKeyViolation { .. }
            | DbError::CheckViolation { .. } => ApiError::InvalidRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => v.into(),
            other => ApiError::InvalidRequest(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::InvalidRequest(err.to_string())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use depot_db::error::classify_database_error;

    #[test]
    fn test_store_errors_map_to_status() {
        let cases = [
            (classify_database_error(Some("42501"), "permission denied"), StatusCode::FORBIDDEN),
            (
                classify_database_error(Some("P0001"), "insufficient product quantity"),
                StatusCode::BAD_REQUEST,
            ),
            (classify_database_error(Some("23503"), "fk"), StatusCode::BAD_REQUEST),
            (classify_database_error(Some("23514"), "check"), StatusCode::BAD_REQUEST),
            (classify_database_error(Some("23505"), "dup"), StatusCode::BAD_REQUEST),
            (DbError::not_found("Invoice", 9), StatusCode::NOT_FOUND),
            (DbError::PoolExhausted, StatusCode::INTERNAL_SERVER_ERROR),
            (classify_database_error(Some("XX000"), "boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (db_err, expected) in cases {
            let label = db_err.to_string();
            assert_eq!(ApiError::from(db_err).status(), expected, "{label}");
        }
    }

    #[test]
    fn test_domain_errors_are_bad_requests() {
        let err: ApiError = DbError::Domain(CoreError::EmptyReceipt(3)).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = DbError::from(ValidationError::required("provider_id")).into();
        assert!(matches!(err, ApiError::InvalidRequest(ref m) if m == "provider_id is required"));
    }

    #[test]
    fn test_permission_detail_not_leaked() {
        let err: ApiError = DbError::PermissionDenied("permission denied for table invoice".into()).into();
        assert!(matches!(err, ApiError::Forbidden(ref m) if m == "Access denied"));
    }
}
