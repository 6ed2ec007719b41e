//! # Service Error Type
//!
//! What a use-case caller sees.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Use-case                                                               │
//! │     │                                                                   │
//! │     ├── bad input?         ValidationError ──────────┐                 │
//! │     ├── unknown product?   CoreError::ProductNotFound ┤                 │
//! │     ├── role too low?      PermissionDenied ──────────┼──► ServiceError │
//! │     ├── write failed?      DbError ───────────────────┤                 │
//! │     └── read too slow?     Timeout ───────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `code()` gives a stable machine-readable category for an outer layer to
//! map onto its own status codes.

use std::time::Duration;

use gunpla_core::{CoreError, ValidationError};
use gunpla_db::DbError;
use serde::Serialize;
use thiserror::Error;

/// Use-case errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Removing media files failed after the rows were already written.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    PermissionDenied,
    Conflict,
    DatabaseError,
    StorageError,
    Timeout,
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Db(err) => match err.root() {
                DbError::NotFound { .. } => ErrorCode::NotFound,
                DbError::Invalid(_) | DbError::ForeignKeyViolation { .. } => {
                    ErrorCode::ValidationError
                }
                DbError::UniqueViolation { .. } => ErrorCode::Conflict,
                DbError::Timeout { .. } => ErrorCode::Timeout,
                _ => ErrorCode::DatabaseError,
            },
            ServiceError::Core(CoreError::ProductNotFound(_)) => ErrorCode::NotFound,
            ServiceError::Core(CoreError::StatusNotPermitted { .. }) => {
                ErrorCode::PermissionDenied
            }
            ServiceError::Core(CoreError::Validation(_)) | ServiceError::Validation(_) => {
                ErrorCode::ValidationError
            }
            ServiceError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            ServiceError::Storage(_) => ErrorCode::StorageError,
            ServiceError::Timeout { .. } => ErrorCode::Timeout,
        }
    }
}

/// Result type for use-case operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================
