//! # Category Repository
//!
//! Flat reference data: a category has an id and a unique title.
//! Products link to categories through `products_categories`.

use gunpla_core::validation::validate_title;
use gunpla_core::{Category, ValidationError};
use std::time::Duration;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult, WriteStep};
use crate::pattern::{bounded, like_pattern};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
    write_timeout: Duration,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool, write_timeout: Duration) -> Self {
        CategoryRepository {
            pool,
            write_timeout,
        }
    }

    /// Lists categories by id, optionally filtered by a title substring.
    pub async fn find(&self, search: Option<&str>) -> DbResult<Vec<Category>> {
        let mut qb: QueryBuilder<'static, Sqlite> =
            QueryBuilder::new("SELECT id, title FROM categories");
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            qb.push(r" WHERE LOWER(title) LIKE ")
                .push_bind(like_pattern(term))
                .push(r" ESCAPE '\'");
        }
        qb.push(" ORDER BY id");

        let rows: Vec<(i64, String)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, title)| Category { id, title })
            .collect())
    }

    /// Inserts several categories in one statement.
    ///
    /// ## Errors
    /// - `DbError::Invalid` - empty list or a bad title (nothing written)
    /// - `DbError::UniqueViolation` - a title already exists (nothing written)
    /// - `DbError::Timeout` - the insert exceeded the write budget (nothing written)
    pub async fn insert(&self, titles: &[String]) -> DbResult<Vec<Category>> {
        if titles.is_empty() {
            return Err(ValidationError::Empty {
                collection: "categories".to_string(),
            }
            .into());
        }
        for title in titles {
            validate_title(title)?;
        }

        debug!(count = titles.len(), "Inserting categories");

        let mut qb: QueryBuilder<'static, Sqlite> = QueryBuilder::new("INSERT INTO categories (title) ");
        qb.push_values(titles, |mut row, title| {
            row.push_bind(title.trim().to_string());
        });
        qb.push(" RETURNING id, title");

        // On timeout the transaction is dropped, which rolls it back
        let rows = bounded(WriteStep::InsertParent, self.write_timeout, async {
            let mut tx = self.pool.begin().await?;
            let rows: Vec<(i64, String)> = qb.build_query_as().fetch_all(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, DbError>(rows)
        })
        .await?;

        // RETURNING order is unspecified
        let mut categories: Vec<Category> = rows
            .into_iter()
            .map(|(id, title)| Category { id, title })
            .collect();
        categories.sort_by_key(|c| c.id);

        info!(count = categories.len(), "Categories inserted");
        Ok(categories)
    }

    /// Deletes a category. Linked products keep existing without one.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = bounded(WriteStep::Delete, self.write_timeout, async {
            sqlx::query("DELETE FROM categories WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(DbError::from)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
