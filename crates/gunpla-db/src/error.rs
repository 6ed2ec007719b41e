//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       │  inside a write Engineer:                                      │
//! │       ▼                                                                 │
//! │  DbError::TransactionFailed { step, source } ← which step broke        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (gunpla-service) ← What the use-case caller sees         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::time::Duration;

use gunpla_core::ValidationError;
use thiserror::Error;

// =============================================================================
// Write Steps
// =============================================================================

/// The stage of a staged write at which something went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    Begin,
    InsertParent,
    InsertChildren,
    UpdateParent,
    UpdateChildren,
    Delete,
    Commit,
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteStep::Begin => "begin transaction",
            WriteStep::InsertParent => "insert parent",
            WriteStep::InsertChildren => "insert children",
            WriteStep::UpdateParent => "update parent",
            WriteStep::UpdateChildren => "update children",
            WriteStep::Delete => "delete",
            WriteStep::Commit => "commit",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `FindOne` on an unknown id
    /// - `UPDATE ... WHERE id = ?` touched zero rows
    /// - Deleting an id that is already gone
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate category title
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Linking a product to a category id that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed (syntax, CHECK constraint, ...).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A staged write failed at `step`. The transaction was rolled back.
    ///
    /// ## When This Occurs
    /// ```text
    /// InsertEngineer::insert()
    ///   1 begin            ✓
    ///   2 insert parent    ✓
    ///   3 insert children  ✗ CHECK constraint failed: qty > 0
    ///        │
    ///        ▼
    ///   rollback, then TransactionFailed { step: InsertChildren, source }
    /// ```
    #[error("Transaction failed at {step}: {source}")]
    TransactionFailed {
        step: WriteStep,
        #[source]
        source: Box<DbError>,
    },

    /// A staged write step exceeded its time budget. Rolled back.
    #[error("Transaction step '{step}' timed out after {after:?}")]
    Timeout { step: WriteStep, after: Duration },

    /// A stored document could not be decoded into its aggregate.
    #[error("Failed to decode {entity}: {message}")]
    Decode { entity: String, message: String },

    /// Input rejected before any database work.
    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Decode error.
    pub fn decode(entity: impl Into<String>, message: impl fmt::Display) -> Self {
        DbError::Decode {
            entity: entity.into(),
            message: message.to_string(),
        }
    }

    /// The underlying cause, looking through `TransactionFailed` wrappers.
    pub fn root(&self) -> &DbError {
        match self {
            DbError::TransactionFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the root cause is a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), DbError::NotFound { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
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

// =============================================================================
// Unit Tests
// =============================================================================
