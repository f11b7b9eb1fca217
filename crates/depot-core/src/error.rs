//! # Error Types
//!
//! Domain-specific error types for depot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  depot-core errors (this file)                                         │
//! │  ├── CoreError        - Lifecycle / business rule violations           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  depot-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, classified by SQLSTATE      │
//! │                                                                         │
//! │  depot-api errors (in app)                                             │
//! │  └── ApiError         - What clients see (status + JSON body)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Every variant is a client mistake (HTTP 400), never an infrastructure
/// failure.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invoice is not in a status that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Completing an invoice that is already completed
    /// - Editing a line of a completed invoice
    #[error("Invoice {invoice_id} is {status}, cannot perform operation")]
    InvalidInvoiceStatus { invoice_id: i64, status: String },

    /// Receipt is not of a type that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Finalizing a receipt that is not a draft
    /// - Returning a draft or a return receipt
    /// - Adding lines to a finalized receipt
    #[error("Receipt {receipt_id} is {receipt_type}, expected {expected}")]
    InvalidReceiptType {
        receipt_id: i64,
        receipt_type: String,
        expected: String,
    },

    /// A draft with no lines cannot be sold.
    #[error("Receipt {0} has no lines")]
    EmptyReceipt(i64),

    /// Return request refers to a line that is not on the source receipt.
    #[error("Line {line_id} does not belong to receipt {receipt_id}")]
    UnknownReturnLine { receipt_id: i64, line_id: i64 },

    /// Return request asks for more than is left of the sold quantity.
    #[error("Cannot return {requested} of line {line_id}: {sold} sold, {returned} already returned")]
    ReturnExceedsSold {
        line_id: i64,
        sold: i64,
        returned: i64,
        requested: i64,
    },

    /// Every line of the sale has already come back.
    #[error("Receipt {0} has been fully returned")]
    NothingToReturn(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any database call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-numeric id, malformed date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Field must not be supplied in this context.
    #[error("{field} must not be set: {reason}")]
    Forbidden { field: String, reason: String },

    /// Two dates are in the wrong order.
    #[error("{earlier} must not be after {later}")]
    DateOrder { earlier: String, later: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ReturnExceedsSold {
            line_id: 7,
            sold: 10,
            returned: 4,
            requested: 7,
        };
        assert_eq!(
            err.to_string(),
            "Cannot return 7 of line 7: 10 sold, 4 already returned"
        );

        let err = CoreError::EmptyReceipt(42);
        assert_eq!(err.to_string(), "Receipt 42 has no lines");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("provider_id").to_string(),
            "provider_id is required"
        );

        let err = ValidationError::DateOrder {
            earlier: "date_of_manufacture".to_string(),
            later: "use_by_date".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "date_of_manufacture must not be after use_by_date"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("status").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
