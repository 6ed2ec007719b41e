//! # Domain Types
//!
//! The two aggregates the shop persists, and the inputs used to write them.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐            ┌─────────────────────┐            │
//! │  │       Order         │            │      Product        │            │
//! │  │  ─────────────────  │            │  ─────────────────  │            │
//! │  │  id (store-made)    │            │  id (store-made)    │            │
//! │  │  user_id            │            │  title, description │            │
//! │  │  status             │            │  price_cents        │            │
//! │  │  total_price_cents  │            │  category ──────────┼──► Category│
//! │  │  transfer_slip      │            │  images[] ──────────┼──► Image   │
//! │  │  products[] ──┐     │            └─────────────────────┘            │
//! │  └───────────────┼─────┘                       ▲                       │
//! │                  ▼                             │ frozen copy           │
//! │        ┌─────────────────────┐                 │                       │
//! │        │   ProductOrder      │─────────────────┘                       │
//! │        │   qty, product      │                                         │
//! │        └─────────────────────┘                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Types vs Write Types
//! - Read types (`Order`, `Product`) carry store-assigned ids and timestamps.
//! - Write types (`NewOrder`, `NewProduct`) have no id: the parent id only
//!   exists once the parent row has been inserted.
//! - Patch types (`OrderPatch`, `ProductPatch`) mark every mutable field
//!   optional; only supplied fields are written.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product category (e.g. "HG", "MG", "PG").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub title: String,
}

// =============================================================================
// Image
// =============================================================================

/// A media file attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Image {
    pub id: String,
    pub filename: String,
    pub url: String,
}

/// An image to attach when writing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewImage {
    pub filename: String,
    pub url: String,
}

// =============================================================================
// Product
// =============================================================================

/// A kit listed in the shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Store-assigned identifier.
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Linked category, absent only if the link row is missing.
    #[serde(default)]
    pub category: Option<Category>,

    #[serde(default)]
    pub images: Vec<Image>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Input for creating a product with its category link and images.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub category_id: i64,
    #[serde(default)]
    pub images: Vec<NewImage>,
}

/// Partial update of a product. `None` fields are left untouched.
///
/// Supplying `images` replaces the whole image set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub category_id: Option<i64>,
    pub images: Option<Vec<NewImage>>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// ## State Flow
/// ```text
/// waiting ──► shipping ──► completed
///    │
///    └──────► canceled   (the only move open to the customer)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, waiting for payment confirmation.
    #[default]
    Waiting,
    /// Paid and handed to the carrier.
    Shipping,
    /// Delivered.
    Completed,
    /// Canceled by the customer or the shop.
    Canceled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Waiting,
        OrderStatus::Shipping,
        OrderStatus::Completed,
        OrderStatus::Canceled,
    ];

    /// The lowercase token used on the wire and in the `orders.status` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Waiting => "waiting",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    /// Case-insensitive parse of a status token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == token)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}

// =============================================================================
// Transfer Slip
// =============================================================================

/// Proof of bank transfer attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferSlip {
    pub id: String,
    pub filename: String,
    pub url: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// One product line of an order.
///
/// Uses the snapshot pattern: `product` is frozen at order time, so later
/// price or title edits do not rewrite order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductOrder {
    pub id: String,
    pub qty: i64,
    pub product: Product,
}

impl ProductOrder {
    /// qty × snapshot price, `None` on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.product.price().checked_mul(self.qty)
    }
}

/// A customer order with its product lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub contact: String,
    pub address: String,
    pub status: OrderStatus,
    pub total_price_cents: i64,
    #[serde(default)]
    pub transfer_slip: Option<TransferSlip>,
    #[serde(default)]
    pub products: Vec<ProductOrder>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the stored total as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// A line to write: quantity plus the authoritative product snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrderLine {
    pub qty: i64,
    pub product: Product,
}

impl NewOrderLine {
    /// qty × authoritative price, `None` on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.product.price().checked_mul(self.qty)
    }
}

/// Input for creating an order with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub user_id: String,
    pub contact: String,
    pub address: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub transfer_slip: Option<TransferSlip>,
    pub total_price_cents: i64,
    pub lines: Vec<NewOrderLine>,
}

/// Partial update of an order. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPatch {
    pub id: String,
    pub status: Option<OrderStatus>,
    pub transfer_slip: Option<TransferSlip>,
    pub contact: Option<String>,
    pub address: Option<String>,
}

impl OrderPatch {
    /// True when no column would change.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.transfer_slip.is_none()
            && self.contact.is_none()
            && self.address.is_none()
    }
}

/// Σ(qty × unit price) over the lines.
///
/// The caller must have replaced each line's product with the authoritative
/// one first; client-supplied totals are never trusted.
///
/// ## Example
/// ```rust
/// use gunpla_core::money::Money;
/// # use gunpla_core::types::{order_total, NewOrderLine, Product};
/// # use chrono::Utc;
/// # let product = |price_cents| Product {
/// #     id: "p".into(), title: "RX-78-2".into(), description: String::new(),
/// #     price_cents, category: None, images: vec![],
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
/// let lines = vec![
///     NewOrderLine { qty: 2, product: product(1000) },
///     NewOrderLine { qty: 1, product: product(500) },
/// ];
/// assert_eq!(order_total(&lines), Ok(Money::from_cents(2500)));
/// ```
///
/// ## Errors
/// `ValidationError::OutOfRange` when a line or the sum overflows.
pub fn order_total(lines: &[NewOrderLine]) -> Result<Money, ValidationError> {
    lines.iter().try_fold(Money::zero(), |total, line| {
        line.line_total()
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "total_price".to_string(),
                min: 0,
                max: i64::MAX,
            })
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
