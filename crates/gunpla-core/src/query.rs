//! # List Query Policy
//!
//! Turns raw listing parameters into typed, allow-listed values.
//!
//! ## Normalization Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw query string                     typed filter                      │
//! │  ─────────────────                    ──────────────                    │
//! │  page=0 limit=1        ──clamp──►     Pagination { page: 1, limit: 5 }  │
//! │  order_by=droptable    ──allow──►     OrderSortColumn::Id  (default)    │
//! │  sort=sideways         ──allow──►     SortDirection::Desc  (default)    │
//! │  start_date=2026-01-01 ──parse──►     NaiveDate                         │
//! │  start_date=yesterday  ──parse──►     ValidationError::InvalidFormat    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here produces SQL text. gunpla-db maps each sort column variant
//! to a column name through a fixed table, so a raw token can never reach
//! the statement.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::OrderStatus;
use crate::validation::validate_search_query;
use crate::{MIN_LIMIT, MIN_PAGE};

// =============================================================================
// Pagination
// =============================================================================

/// Raw page parameters as received from the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
}

/// Normalized page window. Always `page >= 1` and `limit >= 5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Clamps out-of-range values up to the floors. Never fails.
    ///
    /// ## Example
    /// ```rust
    /// use gunpla_core::query::Pagination;
    ///
    /// assert_eq!(Pagination::clamped(0, 1), Pagination { page: 1, limit: 5 });
    /// assert_eq!(Pagination::clamped(3, 20), Pagination { page: 3, limit: 20 });
    /// ```
    pub fn clamped(page: i64, limit: i64) -> Self {
        let clamp = |value: i64, floor: u32| -> u32 {
            if value < floor as i64 {
                floor
            } else {
                u32::try_from(value).unwrap_or(u32::MAX)
            }
        };

        Pagination {
            page: clamp(page, MIN_PAGE),
            limit: clamp(limit, MIN_LIMIT),
        }
    }

    /// Rows to skip: `(page - 1) * limit`, saturating at `i64::MAX`.
    ///
    /// A saturated offset lies past any table, so the page comes back empty.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1).saturating_mul(self.limit as i64)
    }

    /// `ceil(total_items / limit)`.
    #[inline]
    pub fn total_pages(&self, total_items: i64) -> i64 {
        let limit = self.limit as i64;
        (total_items.max(0) + limit - 1) / limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::clamped(0, 0)
    }
}

impl From<PageRequest> for Pagination {
    fn from(req: PageRequest) -> Self {
        Pagination::clamped(req.page, req.limit)
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Raw sort parameters as received from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    pub order_by: Option<String>,
    pub sort: Option<String>,
}

impl SortRequest {
    pub fn new(order_by: impl Into<String>, sort: impl Into<String>) -> Self {
        SortRequest {
            order_by: Some(order_by.into()),
            sort: Some(sort.into()),
        }
    }
}

/// Sort direction. Anything unrecognized becomes `Desc`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Case-insensitive parse with `Desc` fallback.
    pub fn parse_or_default(token: Option<&str>) -> Self {
        match token.map(|t| t.trim().to_ascii_uppercase()).as_deref() {
            Some("ASC") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A closed set of sortable columns for one aggregate.
///
/// `Default` is the fallback for unknown tokens.
pub trait SortColumn: Copy + Default + PartialEq + std::fmt::Debug {
    /// Maps a caller token to a column, `None` if not allow-listed.
    fn parse(token: &str) -> Option<Self>;
}

/// Sortable order columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortColumn {
    #[default]
    Id,
    CreatedAt,
}

impl SortColumn for OrderSortColumn {
    fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "id" => Some(OrderSortColumn::Id),
            "created_at" => Some(OrderSortColumn::CreatedAt),
            _ => None,
        }
    }
}

/// Sortable product columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortColumn {
    Id,
    #[default]
    Title,
    Price,
    CreatedAt,
}

impl SortColumn for ProductSortColumn {
    fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "id" => Some(ProductSortColumn::Id),
            "title" => Some(ProductSortColumn::Title),
            "price" => Some(ProductSortColumn::Price),
            "created_at" => Some(ProductSortColumn::CreatedAt),
            _ => None,
        }
    }
}

/// A resolved sort: allow-listed column plus direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort<C: SortColumn> {
    pub column: C,
    pub direction: SortDirection,
}

impl<C: SortColumn> Sort<C> {
    /// Resolves raw tokens, falling back to defaults instead of failing.
    pub fn resolve(req: &SortRequest) -> Self {
        Sort {
            column: req
                .order_by
                .as_deref()
                .and_then(C::parse)
                .unwrap_or_default(),
            direction: SortDirection::parse_or_default(req.sort.as_deref()),
        }
    }
}

// =============================================================================
// Date Parsing
// =============================================================================

/// Parses a `YYYY-MM-DD` date filter.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Order Filter
// =============================================================================

/// Raw order listing parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub page: PageRequest,
    #[serde(flatten)]
    pub sort: SortRequest,
}

/// Normalized order listing filter.
///
/// `search` matches id, contact or address (case-insensitive substring).
/// Date bounds are inclusive and compare the date part of `created_at`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    /// Restricts the listing to one owner.
    pub user_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Pagination,
    pub sort: Sort<OrderSortColumn>,
}

impl OrderFilter {
    /// Normalizes raw parameters.
    ///
    /// Paging and sorting never fail; a malformed date, status or an
    /// over-long search term does.
    pub fn from_query(query: OrderQuery) -> Result<Self, ValidationError> {
        let search = match non_empty(query.search) {
            Some(s) => Some(validate_search_query(&s)?),
            None => None,
        };
        let status = non_empty(query.status)
            .map(|s| s.parse::<OrderStatus>())
            .transpose()?;
        let start_date = non_empty(query.start_date)
            .map(|d| parse_date("start_date", &d))
            .transpose()?;
        let end_date = non_empty(query.end_date)
            .map(|d| parse_date("end_date", &d))
            .transpose()?;

        Ok(OrderFilter {
            search,
            status,
            user_id: None,
            start_date,
            end_date,
            page: query.page.into(),
            sort: Sort::resolve(&query.sort),
        })
    }

    /// Restricts the listing to one owner.
    pub fn owned_by(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

// =============================================================================
// Product Filter
// =============================================================================

/// Raw product listing parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    pub id: Option<String>,
    pub search: Option<String>,
    pub category_id: Option<i64>,
    #[serde(flatten)]
    pub page: PageRequest,
    #[serde(flatten)]
    pub sort: SortRequest,
}

/// Normalized product listing filter.
///
/// `search` matches title or description (case-insensitive substring).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub id: Option<String>,
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub page: Pagination,
    pub sort: Sort<ProductSortColumn>,
}

impl ProductFilter {
    pub fn from_query(query: ProductQuery) -> Result<Self, ValidationError> {
        let search = match non_empty(query.search) {
            Some(s) => Some(validate_search_query(&s)?),
            None => None,
        };

        Ok(ProductFilter {
            id: non_empty(query.id),
            search,
            category_id: query.category_id.filter(|id| *id > 0),
            page: query.page.into(),
            sort: Sort::resolve(&query.sort),
        })
    }
}

// =============================================================================
// Paginated Response
// =============================================================================

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaginateRes<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_page: i64,
    pub total_item: i64,
}

impl<T> PaginateRes<T> {
    pub fn new(data: Vec<T>, page: Pagination, total_item: i64) -> Self {
        PaginateRes {
            data,
            page: page.page,
            limit: page.limit,
            total_page: page.total_pages(total_item),
            total_item,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps_to_floors() {
        assert_eq!(Pagination::clamped(0, 1), Pagination { page: 1, limit: 5 });
        assert_eq!(Pagination::clamped(-7, -7), Pagination { page: 1, limit: 5 });
        assert_eq!(Pagination::clamped(2, 5), Pagination { page: 2, limit: 5 });
        assert_eq!(Pagination::default(), Pagination { page: 1, limit: 5 });
    }

    #[test]
    fn test_pagination_offset_and_pages() {
        let page = Pagination::clamped(3, 10);
        assert_eq!(page.offset(), 20);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(11), 2);
    }

    #[test]
    fn test_pagination_offset_saturates() {
        let page = Pagination::clamped(i64::MAX, i64::MAX);
        assert_eq!(page, Pagination { page: u32::MAX, limit: u32::MAX });
        assert_eq!(page.offset(), i64::MAX);
        assert_eq!(page.total_pages(3), 1);
    }

    #[test]
    fn test_sort_falls_back_to_defaults() {
        let sort = Sort::<OrderSortColumn>::resolve(&SortRequest::new("droptable", "sideways"));
        assert_eq!(sort.column, OrderSortColumn::Id);
        assert_eq!(sort.direction, SortDirection::Desc);

        let sort = Sort::<ProductSortColumn>::resolve(&SortRequest::default());
        assert_eq!(sort.column, ProductSortColumn::Title);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_accepts_allow_listed_tokens() {
        let sort = Sort::<OrderSortColumn>::resolve(&SortRequest::new("created_at", "asc"));
        assert_eq!(sort.column, OrderSortColumn::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Asc);

        let sort = Sort::<ProductSortColumn>::resolve(&SortRequest::new("PRICE", "Asc"));
        assert_eq!(sort.column, ProductSortColumn::Price);
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn test_order_filter_from_query() {
        let filter = OrderFilter::from_query(OrderQuery {
            search: Some("  bangkok ".to_string()),
            status: Some("Waiting".to_string()),
            start_date: Some("2026-01-01".to_string()),
            end_date: Some(String::new()),
            page: PageRequest { page: 0, limit: 1 },
            sort: SortRequest::default(),
        })
        .unwrap()
        .owned_by("u-1");

        assert_eq!(filter.search.as_deref(), Some("bangkok"));
        assert_eq!(filter.status, Some(OrderStatus::Waiting));
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(filter.end_date, None);
        assert_eq!(filter.user_id.as_deref(), Some("u-1"));
        assert_eq!(filter.page, Pagination { page: 1, limit: 5 });
    }

    #[test]
    fn test_order_filter_rejects_bad_date() {
        let err = OrderFilter::from_query(OrderQuery {
            start_date: Some("01/02/2026".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { field, .. } if field == "start_date"));
    }

    #[test]
    fn test_product_filter_ignores_blank_values() {
        let filter = ProductFilter::from_query(ProductQuery {
            id: Some("  ".to_string()),
            search: None,
            category_id: Some(0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.id, None);
        assert_eq!(filter.category_id, None);
    }

    #[test]
    fn test_paginate_res_totals() {
        let res = PaginateRes::new(vec![1, 2, 3, 4, 5], Pagination::clamped(1, 5), 12);
        assert_eq!(res.total_page, 3);
        assert_eq!(res.total_item, 12);
        assert_eq!(res.limit, 5);
    }
}
