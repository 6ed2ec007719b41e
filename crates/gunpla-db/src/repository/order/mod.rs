//! # Order Repository
//!
//! Database operations for orders and their product lines.
//!
//! ## Read-After-Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert(NewOrder)                                                      │
//! │       │  InsertEngineer(InsertOrderBuilder)                            │
//! │       ▼                                                                 │
//! │  "3f2c…"  (store-assigned id)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  find_one("3f2c…")                                                     │
//! │       │  one row: json_object(order…, 'products', json_group_array(…)) │
//! │       ▼                                                                 │
//! │  Order { products: [ProductOrder { qty, product: <snapshot> }, …] }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod find;
mod insert;

use std::time::Duration;

use gunpla_core::{NewOrder, Order, OrderFilter, OrderPatch, ValidationError};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, WriteStep};
use crate::pattern::find::decode_document;
use crate::pattern::{bounded, FindEngineer, InsertEngineer};
use crate::repository::SQL_NOW;

pub use find::FindOrderBuilder;
pub use insert::InsertOrderBuilder;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    write_timeout: Duration,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool, write_timeout: Duration) -> Self {
        OrderRepository {
            pool,
            write_timeout,
        }
    }

    /// Inserts an order with all its lines, atomically.
    ///
    /// ## Returns
    /// The store-assigned order id.
    ///
    /// ## Errors
    /// - `DbError::Invalid` - no lines, or a bad quantity (nothing written)
    /// - `DbError::TransactionFailed` - a step failed (rolled back)
    /// - `DbError::Timeout` - a step exceeded the write budget (rolled back)
    pub async fn insert(&self, order: NewOrder) -> DbResult<String> {
        debug!(user_id = %order.user_id, lines = order.lines.len(), "Inserting order");

        InsertEngineer::new(
            InsertOrderBuilder::new(self.pool.clone(), order),
            self.write_timeout,
        )
        .insert()
        .await
    }

    /// Writes the supplied fields of an order; `updated_at` always moves.
    ///
    /// ## Errors
    /// - `DbError::NotFound` - no order with this id
    /// - `DbError::Timeout` - the statement exceeded the write budget
    pub async fn update(&self, patch: &OrderPatch) -> DbResult<()> {
        if patch.id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "id".to_string(),
            }
            .into());
        }

        debug!(id = %patch.id, "Updating order");

        let transfer_slip = patch
            .transfer_slip
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(format!("transfer slip encode: {}", e)))?;

        let mut qb: QueryBuilder<'static, Sqlite> = QueryBuilder::new("UPDATE orders SET ");
        let mut set = qb.separated(", ");
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status);
        }
        if let Some(slip) = transfer_slip {
            set.push("transfer_slip = ").push_bind_unseparated(slip);
        }
        if let Some(contact) = &patch.contact {
            set.push("contact = ").push_bind_unseparated(contact.clone());
        }
        if let Some(address) = &patch.address {
            set.push("address = ").push_bind_unseparated(address.clone());
        }
        set.push("updated_at = ").push_unseparated(SQL_NOW);

        qb.push(" WHERE id = ").push_bind(patch.id.clone());

        let result = bounded(WriteStep::UpdateParent, self.write_timeout, async {
            qb.build().execute(&self.pool).await.map_err(DbError::from)
        })
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", &patch.id));
        }

        Ok(())
    }

    /// Gets an order with its lines.
    ///
    /// ## Errors
    /// - `DbError::NotFound` - no order with this id
    /// - `DbError::Decode` - the stored document does not match `Order`
    pub async fn find_one(&self, id: &str) -> DbResult<Order> {
        let mut qb: QueryBuilder<'static, Sqlite> = QueryBuilder::new(find::ORDER_SELECT);
        qb.push(" WHERE o.id = ").push_bind(id.to_string());

        let document: Option<String> = qb
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await?;

        match document {
            Some(doc) => decode_document("Order", &doc),
            None => Err(DbError::not_found("Order", id)),
        }
    }

    /// Lists one page of orders plus the total matching the filter.
    pub async fn find_many(&self, filter: &OrderFilter) -> DbResult<(Vec<Order>, i64)> {
        debug!(page = filter.page.page, limit = filter.page.limit, "Listing orders");

        FindEngineer::new(self.pool.clone(), FindOrderBuilder::new(filter.clone()))
            .find_with_count()
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
    use gunpla_core::query::{Pagination, Sort, SortRequest};
    use gunpla_core::{OrderStatus, TransferSlip};

    use super::*;
    use crate::pattern::InsertBuilder;
    use crate::repository::test_support::{category, db, new_order, product};
    use crate::Database;

    async fn order_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn line_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM products_orders")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_find_one_returns_lines_in_order() {
        let db = db().await;
        let hg = category(&db, "HG").await;
        let zaku = product(&db, "Zaku", 1000, hg).await;
        let gouf = product(&db, "Gouf", 500, hg).await;

        let id = db
            .orders()
            .insert(new_order("u-1", vec![(2, zaku.clone()), (1, gouf.clone())]))
            .await
            .unwrap();

        let order = db.orders().find_one(&id).await.unwrap();
        assert_eq!(order.id, id);
        assert_eq!(order.user_id, "u-1");
        assert_eq!(order.status, OrderStatus::Waiting);
        assert_eq!(order.total_price_cents, 2500);
        assert_eq!(order.transfer_slip, None);
        assert_eq!(order.products.len(), 2);
        assert_eq!(order.products[0].qty, 2);
        assert_eq!(order.products[0].product, zaku);
        assert_eq!(order.products[1].qty, 1);
        assert_eq!(order.products[1].product, gouf);
    }

    #[tokio::test]
    async fn test_empty_lines_rejected_before_any_write() {
        let db = db().await;

        let err = db.orders().insert(new_order("u-1", vec![])).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Invalid(ValidationError::Empty { .. })
        ));
        assert_eq!(order_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_failed_line_insert_leaves_no_order() {
        let db = db().await;
        let hg = category(&db, "HG").await;
        let zaku = product(&db, "Zaku", 1000, hg).await;

        // Skip validation so the CHECK (qty > 0) fires inside the child step.
        let mut order = new_order("u-1", vec![(1, zaku.clone()), (1, zaku)]);
        order.lines[1].qty = 0;
        let mut builder = InsertOrderBuilder::new(db.pool().clone(), order);
        builder.begin().await.unwrap();
        builder.insert_parent().await.unwrap();
        assert!(builder.identifier().is_some());
        assert!(builder.insert_children().await.is_err());
        builder.rollback().await;

        assert_eq!(order_count(&db).await, 0);
        assert_eq!(line_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_engineer_rolls_back_parent_when_children_fail() {
        let db = db().await;
        let hg = category(&db, "HG").await;
        let zaku = product(&db, "Zaku", 1000, hg).await;
        sqlx::query("DROP TABLE products_orders")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db
            .orders()
            .insert(new_order("u-1", vec![(1, zaku)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::TransactionFailed {
                step: WriteStep::InsertChildren,
                ..
            }
        ));
        assert_eq!(order_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_parent_constraint_failure_names_parent_step() {
        let db = db().await;
        let hg = category(&db, "HG").await;
        let zaku = product(&db, "Zaku", 1000, hg).await;

        let mut order = new_order("u-1", vec![(1, zaku)]);
        order.total_price_cents = -1;
        let err = db.orders().insert(order).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::TransactionFailed {
                step: WriteStep::InsertParent,
                ..
            }
        ));
        assert!(matches!(err.root(), DbError::QueryFailed(_)));
        assert_eq!(order_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_too_many_lines_rejected() {
        let db = db().await;
        let hg = category(&db, "HG").await;
        let zaku = product(&db, "Zaku", 1000, hg).await;

        let lines = (0..=gunpla_core::MAX_ORDER_LINES)
            .map(|_| (1, zaku.clone()))
            .collect();
        let err = db.orders().insert(new_order("u-1", lines)).await.unwrap_err();
        assert!(matches!(err, DbError::Invalid(ValidationError::OutOfRange { .. })));
    }

    #[tokio::test]
    async fn test_update_writes_only_supplied_fields() {
        let db = db().await;
        let hg = category(&db, "HG").await;
        let zaku = product(&db, "Zaku", 1000, hg).await;
        let id = db
            .orders()
            .insert(new_order("u-1", vec![(1, zaku)]))
            .await
            .unwrap();
        let before = db.orders().find_one(&id).await.unwrap();

        let slip = TransferSlip {
            id: "slip-1".to_string(),
            filename: "slip.png".to_string(),
            url: "/images/slips/slip.png".to_string(),
            created_at: Utc::now(),
        };
        db.orders()
            .update(&OrderPatch {
                id: id.clone(),
                status: Some(OrderStatus::Canceled),
                transfer_slip: Some(slip.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        let after = db.orders().find_one(&id).await.unwrap();
        assert_eq!(after.status, OrderStatus::Canceled);
        assert_eq!(after.transfer_slip.as_ref().map(|s| &s.id), Some(&slip.id));
        assert_eq!(after.contact, before.contact);
        assert_eq!(after.address, before.address);
        assert_eq!(after.products, before.products);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let db = db().await;
        let err = db
            .orders()
            .update(&OrderPatch {
                id: "missing".to_string(),
                status: Some(OrderStatus::Canceled),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_one_unknown_id_is_not_found() {
        let db = db().await;
        assert!(db.orders().find_one("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_find_one_undecodable_document_is_decode_error() {
        let db = db().await;
        sqlx::query(
            "INSERT INTO orders (id, user_id, contact, address, total_price_cents, created_at) \
             VALUES ('bad', 'u', 'c', 'a', 0, 'not a timestamp')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.orders().find_one("bad").await.unwrap_err();
        assert!(matches!(err, DbError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_find_many_pages_cover_every_match_once() {
        let db = db().await;
        let hg = category(&db, "HG").await;
        let zaku = product(&db, "Zaku", 1000, hg).await;

        for _ in 0..12 {
            db.orders()
                .insert(new_order("u-1", vec![(1, zaku.clone())]))
                .await
                .unwrap();
        }
        db.orders()
            .insert(new_order("u-2", vec![(1, zaku.clone())]))
            .await
            .unwrap();

        let mut seen = HashSet::new();
        for page in 1..=3 {
            let filter = OrderFilter {
                page: Pagination::clamped(page, 5),
                sort: Sort::resolve(&SortRequest::new("created_at", "desc")),
                ..Default::default()
            }
            .owned_by("u-1");

            let (orders, total) = db.orders().find_many(&filter).await.unwrap();
            assert_eq!(total, 12);
            for order in orders {
                assert_eq!(order.user_id, "u-1");
                assert!(seen.insert(order.id));
            }
        }
        assert_eq!(seen.len(), 12);

        // Past the end: empty page, total still reported
        let filter = OrderFilter {
            page: Pagination::clamped(9, 5),
            ..Default::default()
        };
        let (orders, total) = db.orders().find_many(&filter).await.unwrap();
        assert!(orders.is_empty());
        assert_eq!(total, 13);
    }

    #[tokio::test]
    async fn test_find_many_filters() {
        let db = db().await;
        let hg = category(&db, "HG").await;
        let zaku = product(&db, "Zaku", 1000, hg).await;

        let mut order = new_order("u-1", vec![(1, zaku.clone())]);
        order.address = "12 Chiang Mai Rd".to_string();
        let chiang_mai = db.orders().insert(order).await.unwrap();
        let bangkok = db
            .orders()
            .insert(new_order("u-1", vec![(1, zaku.clone())]))
            .await
            .unwrap();
        db.orders()
            .update(&OrderPatch {
                id: bangkok.clone(),
                status: Some(OrderStatus::Shipping),
                ..Default::default()
            })
            .await
            .unwrap();

        // Search is a case-insensitive substring match
        let filter = OrderFilter {
            search: Some("CHIANG".to_string()),
            ..Default::default()
        };
        let (orders, total) = db.orders().find_many(&filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(orders[0].id, chiang_mai);

        // LIKE wildcards in the search term are literal
        let filter = OrderFilter {
            search: Some("%".to_string()),
            ..Default::default()
        };
        assert_eq!(db.orders().find_many(&filter).await.unwrap().1, 0);

        let filter = OrderFilter {
            status: Some(OrderStatus::Shipping),
            ..Default::default()
        };
        let (orders, _) = db.orders().find_many(&filter).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, bangkok);

        // Inclusive date bounds on the date part of created_at
        let today = Utc::now().date_naive();
        let filter = OrderFilter {
            start_date: Some(today),
            end_date: Some(today),
            ..Default::default()
        };
        assert_eq!(db.orders().find_many(&filter).await.unwrap().1, 2);

        let tomorrow = today + ChronoDuration::days(1);
        let filter = OrderFilter {
            start_date: Some(tomorrow),
            ..Default::default()
        };
        assert_eq!(db.orders().find_many(&filter).await.unwrap().1, 0);

        let filter = OrderFilter {
            end_date: NaiveDate::from_ymd_opt(2000, 1, 1),
            ..Default::default()
        };
        assert_eq!(db.orders().find_many(&filter).await.unwrap().1, 0);
    }

    #[tokio::test]
    async fn test_find_many_no_matches() {
        let db = db().await;
        let (orders, total) = db
            .orders()
            .find_many(&OrderFilter::default())
            .await
            .unwrap();
        assert!(orders.is_empty());
        assert_eq!(total, 0);
    }
}
