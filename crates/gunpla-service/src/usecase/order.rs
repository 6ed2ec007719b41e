//! Order use-cases.
//!
//! ## Insert Flow
//! ```text
//! InsertOrderReq { products: [(product_id, qty)], total (ignored) }
//!      │
//!      ├── no lines / bad qty ──► ValidationError (no lookups, no writes)
//!      │
//!      ▼
//! ProductLookup per line ──► authoritative Product (price, snapshot)
//!      │
//!      ▼
//! total = Σ qty × price, status = waiting, owner = actor
//!      │
//!      ▼
//! OrderRepository::insert ──► find_one (read-after-write)
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gunpla_core::validation::{validate_line_count, validate_quantity, validate_uuid};
use gunpla_core::{
    order_total, CoreError, NewOrder, NewOrderLine, Order, OrderFilter, OrderPatch, OrderStatus,
    PaginateRes, TransferSlip, ValidationError,
};
use gunpla_db::OrderRepository;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::within;
use crate::auth::{AccessPolicy, Actor};
use crate::error::{ServiceError, ServiceResult};
use crate::lookup::ProductLookup;

/// One requested line: which product, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineReq {
    pub product_id: String,
    pub qty: i64,
}

/// An uploaded transfer slip, as the caller describes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSlipReq {
    #[serde(default)]
    pub id: Option<String>,
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TransferSlipReq {
    /// Fills a missing id with a fresh UUID and a missing timestamp with now.
    ///
    /// A supplied id must already be a UUID.
    pub fn complete(self) -> Result<TransferSlip, ValidationError> {
        let id = match self.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => {
                validate_uuid(&id)?;
                id
            }
            None => Uuid::new_v4().to_string(),
        };

        Ok(TransferSlip {
            id,
            filename: self.filename,
            url: self.url,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsertOrderReq {
    /// Owner to record; honored only for privileged actors.
    #[serde(default)]
    pub user_id: Option<String>,
    pub contact: String,
    pub address: String,
    #[serde(default)]
    pub transfer_slip: Option<TransferSlipReq>,
    /// Client-side total. Never stored; the total is recomputed.
    #[serde(default)]
    pub total_price_cents: i64,
    pub products: Vec<OrderLineReq>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrderReq {
    pub id: String,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub transfer_slip: Option<TransferSlipReq>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Order use-cases.
#[derive(Clone)]
pub struct OrderUsecase {
    orders: OrderRepository,
    products: Arc<dyn ProductLookup>,
    policy: AccessPolicy,
    request_timeout: Duration,
}

impl OrderUsecase {
    pub fn new(
        orders: OrderRepository,
        products: Arc<dyn ProductLookup>,
        policy: AccessPolicy,
        request_timeout: Duration,
    ) -> Self {
        OrderUsecase {
            orders,
            products,
            policy,
            request_timeout,
        }
    }

    pub async fn find_one(&self, id: &str) -> ServiceResult<Order> {
        within("find order", self.request_timeout, self.orders.find_one(id)).await
    }

    pub async fn find_many(&self, filter: &OrderFilter) -> ServiceResult<PaginateRes<Order>> {
        let (orders, total) =
            within("find orders", self.request_timeout, self.orders.find_many(filter)).await?;
        Ok(PaginateRes::new(orders, filter.page, total))
    }

    /// Places an order priced from the stored products.
    pub async fn insert(&self, actor: &Actor, req: InsertOrderReq) -> ServiceResult<Order> {
        validate_line_count(req.products.len())?;
        for line in &req.products {
            validate_quantity(line.qty)?;
        }

        let transfer_slip = req
            .transfer_slip
            .map(TransferSlipReq::complete)
            .transpose()?;

        let mut lines = Vec::with_capacity(req.products.len());
        for line in &req.products {
            let product = within(
                "find product",
                self.request_timeout,
                self.products.find_product(&line.product_id),
            )
            .await?;
            lines.push(NewOrderLine {
                qty: line.qty,
                product,
            });
        }

        let total = order_total(&lines)?;
        if req.total_price_cents != total.cents() {
            debug!(
                claimed = req.total_price_cents,
                computed = total.cents(),
                "Client total replaced"
            );
        }

        let user_id = match req.user_id {
            Some(id) if self.policy.is_privileged(actor) && !id.trim().is_empty() => id,
            _ => actor.user_id.clone(),
        };

        let order = NewOrder {
            user_id,
            contact: req.contact,
            address: req.address,
            status: OrderStatus::Waiting,
            transfer_slip,
            total_price_cents: total.cents(),
            lines,
        };

        let id = self.orders.insert(order).await?;
        info!(id = %id, total = %total, "Order placed");

        self.find_one(&id).await
    }

    /// Applies the supplied fields. Unprivileged actors may only cancel.
    pub async fn update(&self, actor: &Actor, req: UpdateOrderReq) -> ServiceResult<Order> {
        if let Some(status) = req.status {
            if status != OrderStatus::Canceled && !self.policy.is_privileged(actor) {
                return Err(ServiceError::PermissionDenied(
                    CoreError::StatusNotPermitted { requested: status }.to_string(),
                ));
            }
        }

        let patch = OrderPatch {
            id: req.id,
            status: req.status,
            transfer_slip: req
                .transfer_slip
                .map(TransferSlipReq::complete)
                .transpose()?,
            contact: req.contact,
            address: req.address,
        };

        self.orders.update(&patch).await?;
        self.find_one(&patch.id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
