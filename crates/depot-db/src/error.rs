//! # Database Error Types
//!
//! Error types for database operations, plus the single place where
//! PostgreSQL errors are classified.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (SQLSTATE + message)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  classify_database_error ← THIS MODULE                                 │
//! │       │   42501              → PermissionDenied                         │
//! │       │   stock marker text  → InsufficientStock                        │
//! │       │   23505 / 23503 / 23514 → Unique / ForeignKey / Check           │
//! │       ▼                                                                 │
//! │  ApiError (in depot-api) ← status code + JSON body                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use depot_core::{CoreError, ValidationError};
use thiserror::Error;

/// Text raised by the stock triggers when a debit would go below zero.
pub const INSUFFICIENT_STOCK_MARKER: &str = "insufficient product quantity";

/// Marker raised by stock triggers written before the English message.
pub const LEGACY_INSUFFICIENT_STOCK_MARKER: &str = "недостатня кількість товару";

/// SQLSTATE for `insufficient_privilege`.
pub const SQLSTATE_INSUFFICIENT_PRIVILEGE: &str = "42501";
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";
const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";
const SQLSTATE_CHECK_VIOLATION: &str = "23514";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Id doesn't exist
    /// - A delete that affected zero rows
    /// - Bridge conversion with no open reorder request
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The role behind the current pool may not perform this statement.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A stock trigger refused to debit below zero.
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    /// Unique constraint violation.
    #[error("Duplicate value violates {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a product, invoice or provider that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (provider nullability, batch dates, ...).
    #[error("Check violation: {message}")]
    CheckViolation { message: String },

    /// A lifecycle or validation rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed for a reason not classified above.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Maps a PostgreSQL error to a [`DbError`].
///
/// The stock marker is checked first: triggers raise it with the generic
/// `P0001` code, so the message is the only signal.
///
/// ```rust
/// use depot_db::error::{classify_database_error, DbError};
///
/// let err = classify_database_error(Some("42501"), "permission denied for table invoice");
/// assert!(matches!(err, DbError::PermissionDenied(_)));
/// ```
pub fn classify_database_error(code: Option<&str>, message: &str) -> DbError {
    if message.contains(INSUFFICIENT_STOCK_MARKER)
        || message.contains(LEGACY_INSUFFICIENT_STOCK_MARKER)
    {
        return DbError::InsufficientStock(message.to_string());
    }

    match code {
        Some(SQLSTATE_INSUFFICIENT_PRIVILEGE) => DbError::PermissionDenied(message.to_string()),
        Some(SQLSTATE_UNIQUE_VIOLATION) => DbError::UniqueViolation {
            constraint: message.to_string(),
        },
        Some(SQLSTATE_FOREIGN_KEY_VIOLATION) => DbError::ForeignKeyViolation {
            message: message.to_string(),
        },
        Some(SQLSTATE_CHECK_VIOLATION) => DbError::CheckViolation {
            message: message.to_string(),
        },
        _ => DbError::QueryFailed(message.to_string()),
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → classify_database_error(code, message)
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let code = db_err.code();
                classify_database_error(code.as_deref(), db_err.message())
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_violation_is_permission_denied() {
        let err = classify_database_error(Some("42501"), "permission denied for table invoice");
        assert!(matches!(err, DbError::PermissionDenied(_)));
    }

    #[test]
    fn test_stock_marker_wins_over_code() {
        let err = classify_database_error(
            Some("P0001"),
            "insufficient product quantity: product 7 has 3, requested 5",
        );
        assert!(matches!(err, DbError::InsufficientStock(_)));

        let err = classify_database_error(None, "помилка: недостатня кількість товару");
        assert!(matches!(err, DbError::InsufficientStock(_)));
    }

    #[test]
    fn test_constraint_codes() {
        assert!(matches!(
            classify_database_error(Some("23505"), "dup"),
            DbError::UniqueViolation { .. }
        ));
        assert!(matches!(
            classify_database_error(Some("23503"), "fk"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(
            classify_database_error(Some("23514"), "check"),
            DbError::CheckViolation { .. }
        ));
        assert!(matches!(
            classify_database_error(Some("22P02"), "bad input"),
            DbError::QueryFailed(_)
        ));
    }

    #[test]
    fn test_validation_lifts_into_domain() {
        let err: DbError = ValidationError::required("status").into();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }
}
