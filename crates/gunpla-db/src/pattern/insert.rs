//! # Staged Insert
//!
//! Writes a parent row and its child rows as one atomic unit.
//!
//! ## Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InsertEngineer::insert()                                              │
//! │                                                                         │
//! │  0. validate()         ✗ → DbError::Invalid        (no DB work done)   │
//! │  1. begin()            ✗ → TransactionFailed{Begin}                    │
//! │  2. insert_parent()    ✗ → rollback, TransactionFailed{InsertParent}   │
//! │       │ RETURNING id: the parent id now exists                         │
//! │  3. insert_children()  ✗ → rollback, TransactionFailed{InsertChildren} │
//! │       │ one batched INSERT, parent id bound into every row             │
//! │  4. commit()           ✗ → TransactionFailed{Commit}                   │
//! │  5. identifier()       None → DbError::Internal                        │
//! │                                                                         │
//! │  Any step over budget  → rollback, DbError::Timeout{step}              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no retries, and a failure is never reported as success.

use std::time::Duration;

use async_trait::async_trait;
use gunpla_core::ValidationError;
use tracing::{debug, info};

use super::run_step;
use crate::error::{DbError, DbResult, WriteStep};

/// SQL for one aggregate's staged insert.
///
/// Implementors own their transaction handle; the Engineer never sees it.
#[async_trait]
pub trait InsertBuilder: Send {
    /// Name used in logs and errors (e.g. `"Order"`).
    fn entity(&self) -> &'static str;

    /// Checks the input. Runs before any database call.
    fn validate(&self) -> Result<(), ValidationError>;

    async fn begin(&mut self) -> DbResult<()>;

    /// Inserts the parent row and remembers the id the store assigned.
    async fn insert_parent(&mut self) -> DbResult<()>;

    /// Inserts every child row, each carrying the parent id.
    async fn insert_children(&mut self) -> DbResult<()>;

    async fn commit(&mut self) -> DbResult<()>;

    /// Discards the transaction. A no-op when none is open.
    async fn rollback(&mut self);

    /// The parent id, available once `insert_parent` has succeeded.
    fn identifier(&self) -> Option<&str>;
}

/// Drives an [`InsertBuilder`] through the staged protocol.
pub struct InsertEngineer<B> {
    builder: B,
    step_timeout: Duration,
}

impl<B: InsertBuilder> InsertEngineer<B> {
    pub fn new(builder: B, step_timeout: Duration) -> Self {
        InsertEngineer {
            builder,
            step_timeout,
        }
    }

    /// Runs the protocol and returns the new parent id.
    pub async fn insert(mut self) -> DbResult<String> {
        let entity = self.builder.entity();
        let budget = self.step_timeout;

        self.builder.validate()?;

        run_step(WriteStep::Begin, budget, self.builder.begin()).await?;

        if let Err(e) = run_step(WriteStep::InsertParent, budget, self.builder.insert_parent()).await {
            self.builder.rollback().await;
            return Err(e);
        }
        debug!(entity, id = ?self.builder.identifier(), "Parent row inserted");

        if let Err(e) =
            run_step(WriteStep::InsertChildren, budget, self.builder.insert_children()).await
        {
            self.builder.rollback().await;
            return Err(e);
        }

        if let Err(e) = run_step(WriteStep::Commit, budget, self.builder.commit()).await {
            self.builder.rollback().await;
            return Err(e);
        }

        let id = self
            .builder
            .identifier()
            .map(str::to_string)
            .ok_or_else(|| DbError::Internal(format!("{} committed without an id", entity)))?;

        info!(entity, id = %id, "Aggregate inserted");
        Ok(id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every call; fails or stalls at a chosen step.
    struct FakeBuilder {
        calls: Arc<Mutex<Vec<&'static str>>>,
        fail_at: Option<&'static str>,
        stall_at: Option<&'static str>,
        invalid: bool,
        id: Option<String>,
    }

    impl FakeBuilder {
        fn new(calls: Arc<Mutex<Vec<&'static str>>>) -> Self {
            FakeBuilder {
                calls,
                fail_at: None,
                stall_at: None,
                invalid: false,
                id: None,
            }
        }

        async fn step(&mut self, name: &'static str) -> DbResult<()> {
            self.calls.lock().unwrap().push(name);
            if self.stall_at == Some(name) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.fail_at == Some(name) {
                return Err(DbError::QueryFailed(format!("{} exploded", name)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl InsertBuilder for FakeBuilder {
        fn entity(&self) -> &'static str {
            "Fake"
        }

        fn validate(&self) -> Result<(), ValidationError> {
            if self.invalid {
                return Err(ValidationError::Empty {
                    collection: "children".to_string(),
                });
            }
            Ok(())
        }

        async fn begin(&mut self) -> DbResult<()> {
            self.step("begin").await
        }

        async fn insert_parent(&mut self) -> DbResult<()> {
            self.step("insert_parent").await?;
            self.id = Some("fake-1".to_string());
            Ok(())
        }

        async fn insert_children(&mut self) -> DbResult<()> {
            self.step("insert_children").await
        }

        async fn commit(&mut self) -> DbResult<()> {
            self.step("commit").await
        }

        async fn rollback(&mut self) {
            self.calls.lock().unwrap().push("rollback");
        }

        fn identifier(&self) -> Option<&str> {
            self.id.as_deref()
        }
    }

    fn calls() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_happy_path_runs_steps_in_order() {
        let log = calls();
        let id = InsertEngineer::new(FakeBuilder::new(log.clone()), Duration::from_secs(1))
            .insert()
            .await
            .unwrap();

        assert_eq!(id, "fake-1");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["begin", "insert_parent", "insert_children", "commit"]
        );
    }

    #[tokio::test]
    async fn test_validation_failure_touches_nothing() {
        let log = calls();
        let mut builder = FakeBuilder::new(log.clone());
        builder.invalid = true;

        let err = InsertEngineer::new(builder, Duration::from_secs(1))
            .insert()
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Invalid(ValidationError::Empty { .. })));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_child_failure_rolls_back_and_names_step() {
        let log = calls();
        let mut builder = FakeBuilder::new(log.clone());
        builder.fail_at = Some("insert_children");

        let err = InsertEngineer::new(builder, Duration::from_secs(1))
            .insert()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::TransactionFailed {
                step: WriteStep::InsertChildren,
                ..
            }
        ));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["begin", "insert_parent", "insert_children", "rollback"]
        );
    }

    #[tokio::test]
    async fn test_parent_failure_skips_children() {
        let log = calls();
        let mut builder = FakeBuilder::new(log.clone());
        builder.fail_at = Some("insert_parent");

        let err = InsertEngineer::new(builder, Duration::from_secs(1))
            .insert()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::TransactionFailed {
                step: WriteStep::InsertParent,
                ..
            }
        ));
        assert_eq!(*log.lock().unwrap(), vec!["begin", "insert_parent", "rollback"]);
    }

    #[tokio::test]
    async fn test_begin_failure_is_reported() {
        let log = calls();
        let mut builder = FakeBuilder::new(log.clone());
        builder.fail_at = Some("begin");

        let err = InsertEngineer::new(builder, Duration::from_secs(1))
            .insert()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::TransactionFailed {
                step: WriteStep::Begin,
                ..
            }
        ));
        assert_eq!(*log.lock().unwrap(), vec!["begin"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_step_times_out_and_rolls_back() {
        let log = calls();
        let mut builder = FakeBuilder::new(log.clone());
        builder.stall_at = Some("insert_children");

        let err = InsertEngineer::new(builder, Duration::from_secs(10))
            .insert()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Timeout {
                step: WriteStep::InsertChildren,
                ..
            }
        ));
        assert_eq!(log.lock().unwrap().last(), Some(&"rollback"));
    }
}
