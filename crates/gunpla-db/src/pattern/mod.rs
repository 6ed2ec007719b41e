//! # Builder / Engineer Pattern
//!
//! Every aggregate write and list read goes through the same two-part shape:
//! a **Builder** knows the SQL for one aggregate, an **Engineer** knows the
//! protocol and drives any Builder through it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   InsertEngineer ──drives──► InsertBuilder                             │
//! │     validate → begin → insert_parent → insert_children → commit       │
//! │                                  │            │                        │
//! │                                  └─ fail ─────┴──► rollback            │
//! │                                                                         │
//! │   UpdateEngineer ──drives──► UpdateBuilder                             │
//! │     validate → begin → update_parent → update_children → commit       │
//! │                                                                         │
//! │   FindEngineer   ──drives──► FindBuilder                               │
//! │     find_query  (select + WHERE + ORDER BY + LIMIT/OFFSET)             │
//! │     count_query (count  + same WHERE)                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`insert`] - Staged, all-or-nothing aggregate inserts
//! - [`update`] - Staged partial updates with child replacement
//! - [`find`] - Parameterized filter/sort/paginate reads

use std::future::Future;
use std::time::Duration;

use sqlx::{Sqlite, Transaction};
use tracing::warn;

use crate::error::{DbError, DbResult, WriteStep};

pub mod find;
pub mod insert;
pub mod update;

pub use find::{like_pattern, BindValue, Filter, FindBuilder, FindEngineer, OrderClause};
pub use insert::{InsertBuilder, InsertEngineer};
pub use update::{UpdateBuilder, UpdateEngineer};

/// A write transaction owned by exactly one Builder.
pub type Tx = Transaction<'static, Sqlite>;

/// Runs one write step under the time budget.
///
/// A step error becomes `TransactionFailed { step }`; an elapsed budget
/// becomes `Timeout { step }`.
pub(crate) async fn run_step<T, F>(step: WriteStep, budget: Duration, fut: F) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(DbError::TransactionFailed {
            step,
            source: Box::new(source),
        }),
        Err(_) => {
            warn!(%step, budget_ms = budget.as_millis() as u64, "Write step timed out");
            Err(DbError::Timeout {
                step,
                after: budget,
            })
        }
    }
}

/// Runs a single-statement write under the time budget.
///
/// Unlike [`run_step`], errors pass through unchanged; only an elapsed
/// budget is rewritten, to `Timeout { step }`.
pub(crate) async fn bounded<T, F>(step: WriteStep, budget: Duration, fut: F) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(%step, budget_ms = budget.as_millis() as u64, "Write timed out");
            Err(DbError::Timeout {
                step,
                after: budget,
            })
        }
    }
}

/// The open transaction, or an internal error if `begin` has not run.
pub(crate) fn active(tx: &mut Option<Tx>) -> DbResult<&mut Tx> {
    tx.as_mut()
        .ok_or_else(|| DbError::Internal("no open transaction".to_string()))
}

/// Commits the transaction held in `tx`, leaving `None` behind.
pub(crate) async fn commit(tx: &mut Option<Tx>) -> DbResult<()> {
    let tx = tx
        .take()
        .ok_or_else(|| DbError::Internal("no open transaction".to_string()))?;
    tx.commit().await?;
    Ok(())
}

/// Rolls back the transaction held in `tx`, if any. Never fails; a failed
/// rollback is logged and the connection is discarded by the pool.
pub(crate) async fn rollback(entity: &str, tx: &mut Option<Tx>) {
    if let Some(tx) = tx.take() {
        if let Err(e) = tx.rollback().await {
            warn!(entity, error = %e, "Rollback failed");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_stalled_write_times_out() {
        let err = bounded(
            WriteStep::Delete,
            Duration::from_secs(10),
            std::future::pending::<DbResult<()>>(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DbError::Timeout {
                step: WriteStep::Delete,
                after,
            } if after == Duration::from_secs(10)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_passes_errors_through() {
        let err = bounded(WriteStep::UpdateParent, Duration::from_secs(10), async {
            Err::<(), _>(DbError::not_found("Order", "o-1"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_step_wraps_errors_with_step() {
        let err = run_step(WriteStep::InsertParent, Duration::from_secs(10), async {
            Err::<(), _>(DbError::not_found("Order", "o-1"))
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DbError::TransactionFailed {
                step: WriteStep::InsertParent,
                ..
            }
        ));
        assert!(err.is_not_found());
    }
}
