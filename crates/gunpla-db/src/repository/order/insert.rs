//! Staged insert of an order and its product lines.

use async_trait::async_trait;
use gunpla_core::validation::validate_new_order;
use gunpla_core::{NewOrder, ValidationError};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};
use crate::pattern::{self, InsertBuilder, Tx};

/// Writes `orders` then one batched `products_orders` insert.
///
/// ```text
/// orders           ← user, contact, address, status, slip, total   RETURNING id
/// products_orders  ← (order_id, position, qty, product_id, snapshot) × N
/// ```
pub struct InsertOrderBuilder {
    pool: SqlitePool,
    order: NewOrder,
    tx: Option<Tx>,
    order_id: Option<String>,
}

impl InsertOrderBuilder {
    pub fn new(pool: SqlitePool, order: NewOrder) -> Self {
        InsertOrderBuilder {
            pool,
            order,
            tx: None,
            order_id: None,
        }
    }
}

#[async_trait]
impl InsertBuilder for InsertOrderBuilder {
    fn entity(&self) -> &'static str {
        "Order"
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_new_order(&self.order)
    }

    async fn begin(&mut self) -> DbResult<()> {
        self.tx = Some(self.pool.begin().await?);
        Ok(())
    }

    async fn insert_parent(&mut self) -> DbResult<()> {
        let tx = pattern::active(&mut self.tx)?;
        let order = &self.order;

        let transfer_slip = order
            .transfer_slip
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(format!("transfer slip encode: {}", e)))?;

        let id: String = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, contact, address, status, total_price_cents, transfer_slip)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&order.user_id)
        .bind(&order.contact)
        .bind(&order.address)
        .bind(order.status)
        .bind(order.total_price_cents)
        .bind(transfer_slip)
        .fetch_one(&mut **tx)
        .await?;

        self.order_id = Some(id);
        Ok(())
    }

    async fn insert_children(&mut self) -> DbResult<()> {
        let order_id = self
            .order_id
            .clone()
            .ok_or_else(|| DbError::Internal("order id missing before lines".to_string()))?;

        // Snapshots are encoded up front: push_values cannot fail midway.
        let rows = self
            .order
            .lines
            .iter()
            .enumerate()
            .map(|(position, line)| {
                serde_json::to_string(&line.product)
                    .map(|snapshot| (position as i64, line.qty, line.product.id.clone(), snapshot))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::Internal(format!("product snapshot encode: {}", e)))?;

        let mut qb: QueryBuilder<'static, Sqlite> = QueryBuilder::new(
            "INSERT INTO products_orders (order_id, position, qty, product_id, product) ",
        );
        qb.push_values(rows, |mut row, (position, qty, product_id, snapshot)| {
            row.push_bind(order_id.clone())
                .push_bind(position)
                .push_bind(qty)
                .push_bind(product_id)
                .push_bind(snapshot);
        });

        let tx = pattern::active(&mut self.tx)?;
        qb.build().execute(&mut **tx).await?;
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        pattern::commit(&mut self.tx).await
    }

    async fn rollback(&mut self) {
        pattern::rollback(self.entity(), &mut self.tx).await;
    }

    fn identifier(&self) -> Option<&str> {
        self.order_id.as_deref()
    }
}
