//! # Parameterized List Reads
//!
//! Builds filtered, sorted, paginated queries where every caller value is
//! a bound parameter, and decodes one aggregate per row.
//!
//! ## Query Assembly
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  find_query                          count_query                        │
//! │  ──────────                          ───────────                        │
//! │  SELECT json_object(...) ...         SELECT COUNT(*) ...                │
//! │  WHERE  a = ? AND b LIKE ?    ◄──same Filter──►  WHERE a = ? AND b ...  │
//! │  ORDER BY <allow-listed> <ASC|DESC>, <tiebreak>                         │
//! │  LIMIT ? OFFSET ?                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Predicate fragments and ORDER BY columns are `&'static str`: they can
//! only come from code. Caller text travels as [`BindValue`]s.

use gunpla_core::query::{Pagination, SortDirection};
use serde::de::DeserializeOwned;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

// =============================================================================
// Filter
// =============================================================================

/// A value bound into a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    Int(i64),
}

impl BindValue {
    fn push_onto(self, qb: &mut QueryBuilder<'static, Sqlite>) {
        match self {
            BindValue::Text(s) => {
                qb.push_bind(s);
            }
            BindValue::Int(i) => {
                qb.push_bind(i);
            }
        }
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_string())
    }
}

impl From<i64> for BindValue {
    fn from(i: i64) -> Self {
        BindValue::Int(i)
    }
}

/// Conjunction of predicates, each a static fragment with `?` markers plus
/// the values for those markers, in order.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(&'static str, Vec<BindValue>)>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    /// Adds `fragment` with one value per `?`.
    pub fn and(&mut self, fragment: &'static str, values: Vec<BindValue>) -> &mut Self {
        debug_assert_eq!(
            fragment.matches('?').count(),
            values.len(),
            "placeholder count mismatch in {fragment}"
        );
        self.clauses.push((fragment, values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Emits ` WHERE a AND b ...`, or nothing for an empty filter.
    pub fn push_where(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        for (i, (fragment, values)) in self.clauses.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });

            let mut values = values.iter().cloned();
            let mut parts = fragment.split('?');
            if let Some(head) = parts.next() {
                qb.push(head);
            }
            for part in parts {
                if let Some(value) = values.next() {
                    value.push_onto(qb);
                }
                qb.push(part);
            }
        }
    }
}

/// Turns a search term into a case-insensitive substring pattern.
///
/// LIKE wildcards in the term are escaped, so `50%` matches the literal
/// text. Use with `LOWER(col) LIKE ? ESCAPE '\'`.
///
/// ## Example
/// ```rust
/// use gunpla_db::pattern::like_pattern;
///
/// assert_eq!(like_pattern("Zaku"), "%zaku%");
/// assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
/// ```
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

// =============================================================================
// Ordering
// =============================================================================

/// ORDER BY clause built from fixed column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderClause {
    pub column: &'static str,
    pub direction: SortDirection,
    /// A unique column appended after `column` so equal keys page stably.
    pub tiebreak: Option<&'static str>,
}

impl OrderClause {
    pub fn push(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        qb.push(" ORDER BY ")
            .push(self.column)
            .push(" ")
            .push(self.direction.as_sql());

        if let Some(tiebreak) = self.tiebreak.filter(|t| *t != self.column) {
            qb.push(", ")
                .push(tiebreak)
                .push(" ")
                .push(self.direction.as_sql());
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// SQL for one aggregate's list read.
///
/// `select_sql` must project a single JSON text column per row.
pub trait FindBuilder: Send + Sync {
    type Item: DeserializeOwned + Send;

    fn entity(&self) -> &'static str;

    /// `SELECT <json document> FROM ...` without WHERE.
    fn select_sql(&self) -> &'static str;

    /// `SELECT COUNT(*) FROM ...` over the same FROM clause.
    fn count_sql(&self) -> &'static str;

    fn filter(&self) -> Filter;

    fn order_clause(&self) -> OrderClause;

    fn pagination(&self) -> Pagination;

    fn find_query(&self) -> QueryBuilder<'static, Sqlite> {
        let page = self.pagination();
        let mut qb = QueryBuilder::new(self.select_sql());
        self.filter().push_where(&mut qb);
        self.order_clause().push(&mut qb);
        qb.push(" LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());
        qb
    }

    fn count_query(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(self.count_sql());
        self.filter().push_where(&mut qb);
        qb
    }
}

/// Decodes one stored document.
pub fn decode_document<T: DeserializeOwned>(entity: &str, document: &str) -> DbResult<T> {
    serde_json::from_str(document).map_err(|e| DbError::decode(entity, e))
}

// =============================================================================
// Engineer
// =============================================================================

/// Runs a [`FindBuilder`]'s queries against the pool.
pub struct FindEngineer<B> {
    pool: SqlitePool,
    builder: B,
}

impl<B: FindBuilder> FindEngineer<B> {
    pub fn new(pool: SqlitePool, builder: B) -> Self {
        FindEngineer { pool, builder }
    }

    /// The page of aggregates, in the requested order.
    pub async fn find(&self) -> DbResult<Vec<B::Item>> {
        let entity = self.builder.entity();
        let mut qb = self.builder.find_query();
        let documents: Vec<String> = qb.build_query_scalar().fetch_all(&self.pool).await?;

        let items = documents
            .iter()
            .map(|doc| decode_document(entity, doc))
            .collect::<DbResult<Vec<_>>>()?;

        debug!(entity, count = items.len(), "Find returned rows");
        Ok(items)
    }

    /// Rows matching the filter, ignoring pagination.
    pub async fn count(&self) -> DbResult<i64> {
        let mut qb = self.builder.count_query();
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    /// Page and total, fetched concurrently on separate connections.
    pub async fn find_with_count(&self) -> DbResult<(Vec<B::Item>, i64)> {
        tokio::try_join!(self.find(), self.count())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
