//! # Staged Update
//!
//! Same shape as the staged insert, without identifier extraction:
//! `begin → update_parent → update_children → commit`.
//!
//! The parent step writes only the columns the caller supplied. The child
//! step replaces whole child sets (e.g. a product's images) and may hand
//! back what it removed, so the caller can clean up external resources
//! after the commit.

use std::time::Duration;

use async_trait::async_trait;
use gunpla_core::ValidationError;
use tracing::info;

use super::run_step;
use crate::error::{DbResult, WriteStep};

/// SQL for one aggregate's staged partial update.
#[async_trait]
pub trait UpdateBuilder: Send {
    /// What a successful update hands back to the caller.
    type Output: Send;

    fn entity(&self) -> &'static str;

    /// Id of the aggregate being updated, for logs.
    fn target(&self) -> &str;

    fn validate(&self) -> Result<(), ValidationError>;

    async fn begin(&mut self) -> DbResult<()>;

    /// Writes the supplied parent columns. Zero rows touched is `NotFound`.
    async fn update_parent(&mut self) -> DbResult<()>;

    /// Replaces the supplied child sets.
    async fn update_children(&mut self) -> DbResult<()>;

    async fn commit(&mut self) -> DbResult<()>;

    async fn rollback(&mut self);

    /// Consumes the builder after commit.
    fn into_output(self) -> Self::Output;
}

/// Drives an [`UpdateBuilder`] through the staged protocol.
pub struct UpdateEngineer<B> {
    builder: B,
    step_timeout: Duration,
}

impl<B: UpdateBuilder> UpdateEngineer<B> {
    pub fn new(builder: B, step_timeout: Duration) -> Self {
        UpdateEngineer {
            builder,
            step_timeout,
        }
    }

    pub async fn update(mut self) -> DbResult<B::Output> {
        let budget = self.step_timeout;

        self.builder.validate()?;

        run_step(WriteStep::Begin, budget, self.builder.begin()).await?;

        if let Err(e) = run_step(WriteStep::UpdateParent, budget, self.builder.update_parent()).await {
            self.builder.rollback().await;
            return Err(e);
        }

        if let Err(e) =
            run_step(WriteStep::UpdateChildren, budget, self.builder.update_children()).await
        {
            self.builder.rollback().await;
            return Err(e);
        }

        if let Err(e) = run_step(WriteStep::Commit, budget, self.builder.commit()).await {
            self.builder.rollback().await;
            return Err(e);
        }

        info!(
            entity = self.builder.entity(),
            id = %self.builder.target(),
            "Aggregate updated"
        );
        Ok(self.builder.into_output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    struct FakeUpdate {
        log: Vec<&'static str>,
        missing: bool,
    }

    #[async_trait]
    impl UpdateBuilder for FakeUpdate {
        type Output = Vec<&'static str>;

        fn entity(&self) -> &'static str {
            "Fake"
        }

        fn target(&self) -> &str {
            "fake-1"
        }

        fn validate(&self) -> Result<(), ValidationError> {
            Ok(())
        }

        async fn begin(&mut self) -> DbResult<()> {
            self.log.push("begin");
            Ok(())
        }

        async fn update_parent(&mut self) -> DbResult<()> {
            self.log.push("update_parent");
            if self.missing {
                return Err(DbError::not_found("Fake", "fake-1"));
            }
            Ok(())
        }

        async fn update_children(&mut self) -> DbResult<()> {
            self.log.push("update_children");
            Ok(())
        }

        async fn commit(&mut self) -> DbResult<()> {
            self.log.push("commit");
            Ok(())
        }

        async fn rollback(&mut self) {
            self.log.push("rollback");
        }

        fn into_output(self) -> Self::Output {
            self.log
        }
    }

    #[tokio::test]
    async fn test_update_runs_steps_in_order() {
        let log = UpdateEngineer::new(
            FakeUpdate {
                log: vec![],
                missing: false,
            },
            Duration::from_secs(1),
        )
        .update()
        .await
        .unwrap();

        assert_eq!(log, vec!["begin", "update_parent", "update_children", "commit"]);
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let err = UpdateEngineer::new(
            FakeUpdate {
                log: vec![],
                missing: true,
            },
            Duration::from_secs(1),
        )
        .update()
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DbError::TransactionFailed {
                step: WriteStep::UpdateParent,
                ..
            }
        ));
        assert!(err.is_not_found());
    }
}
