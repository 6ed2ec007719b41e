//! # Error Types
//!
//! Domain-specific error types for gunpla-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gunpla-core errors (this file)                                        │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gunpla-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  gunpla-service errors                                                 │
//! │  └── ServiceError     - What the use-case caller sees                  │
//! │                                                                         │
//! │  Flow: ValidationError → DbError / CoreError → ServiceError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Validation failures happen before any database work

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An order line references a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The actor's role does not allow the requested status change.
    ///
    /// ## When This Occurs
    /// ```text
    /// Customer updates order with status "shipping"
    ///      │
    ///      ▼
    /// Only "canceled" is open to unprivileged actors
    ///      │
    ///      ▼
    /// StatusNotPermitted { requested: Shipping }
    /// ```
    #[error("Status '{requested}' cannot be set by this actor")]
    StatusNotPermitted { requested: OrderStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any database call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A child collection that must carry at least one element is empty.
    #[error("{collection} must not be empty")]
    Empty { collection: String },
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
        let err = CoreError::StatusNotPermitted {
            requested: OrderStatus::Shipping,
        };
        assert_eq!(
            err.to_string(),
            "Status 'shipping' cannot be set by this actor"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Empty {
            collection: "products".to_string(),
        };
        assert_eq!(err.to_string(), "products must not be empty");

        let err = ValidationError::Required {
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "contact".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
