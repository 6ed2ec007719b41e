//! # Use-cases
//!
//! One use-case per aggregate. Each holds its repository plus the
//! collaborators it needs, and returns the aggregate as stored.
//!
//! ```text
//! OrderUsecase    ── OrderRepository + ProductLookup + AccessPolicy
//! ProductUsecase  ── ProductRepository + FileStorage
//! ```

pub mod order;
pub mod product;

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ServiceError, ServiceResult};

pub use order::{InsertOrderReq, OrderLineReq, OrderUsecase, TransferSlipReq, UpdateOrderReq};
pub use product::ProductUsecase;

/// Runs a read under the request deadline.
pub(crate) async fn within<T, E, F>(operation: &'static str, budget: Duration, fut: F) -> ServiceResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ServiceError>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            warn!(operation, budget_ms = budget.as_millis() as u64, "Request deadline exceeded");
            Err(ServiceError::Timeout {
                operation,
                after: budget,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gunpla_db::DbError;

    #[tokio::test(start_paused = true)]
    async fn test_within_times_out_slow_reads() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, DbError>(())
        };

        let err = within("find orders", Duration::from_secs(1), slow)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Timeout {
                operation: "find orders",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_within_passes_errors_through() {
        let failing = async { Err::<(), _>(DbError::not_found("Order", "o-1")) };
        let err = within("find order", Duration::from_secs(1), failing)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Db(DbError::NotFound { .. })));
    }
}
