//! # gunpla-core: Pure Domain Logic for Gunpla Shop
//!
//! This crate holds the aggregates the shop persists (orders with their
//! product lines, products with their category and images) and the policy
//! that governs how they are listed. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Gunpla Shop Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 gunpla-service (use-cases)                      │   │
//! │  │    insert order, update order, add product, list products      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gunpla-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   query   │  │   auth    │  │ validation│  │   │
//! │  │   │   Order   │  │ Paginate  │  │ RoleBits  │  │   rules   │  │   │
//! │  │   │  Product  │  │ Sort/Filt │  │ has_access│  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    gunpla-db (Database Layer)                   │   │
//! │  │         Builders, Engineers, repositories, migrations           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Aggregates (Order, Product) and their write/patch inputs
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`query`] - Pagination clamping, sort allow-lists, list filters
//! - [`auth`] - Role bitmask capability checks
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use gunpla_core::query::{Pagination, Sort, SortDirection, SortRequest, OrderSortColumn};
//!
//! // Out-of-range paging is clamped, never rejected
//! let page = Pagination::clamped(0, 1);
//! assert_eq!((page.page, page.limit), (1, 5));
//!
//! // Unknown sort tokens fall back to the allow-list defaults
//! let sort = Sort::<OrderSortColumn>::resolve(&SortRequest::new("droptable", "sideways"));
//! assert_eq!(sort.column, OrderSortColumn::Id);
//! assert_eq!(sort.direction, SortDirection::Desc);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod money;
pub mod query;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use gunpla_core::Order` instead of
// `use gunpla_core::types::Order`

pub use auth::{has_access, RoleBits};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use query::{OrderFilter, PaginateRes, Pagination, ProductFilter};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Lowest page number a listing accepts; smaller values are clamped up.
pub const MIN_PAGE: u32 = 1;

/// Smallest page size a listing accepts; smaller values are clamped up.
pub const MIN_LIMIT: u32 = 5;

/// Maximum quantity of a single product line in an order.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum number of product lines in one order.
pub const MAX_ORDER_LINES: usize = 100;
