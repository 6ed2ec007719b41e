//! # Product Repository
//!
//! Database operations for products, their category link and images.
//!
//! ## Child Tables
//! ```text
//! products ──┬── products_categories (exactly one link)
//!            └── images              (ordered by position)
//! ```
//!
//! Updates and deletes hand back the image rows they removed; the caller
//! owns deleting those files once the write has committed.

mod find;
mod insert;
mod update;

use std::time::Duration;

use gunpla_core::{Image, NewProduct, Product, ProductFilter, ProductPatch};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult, WriteStep};
use crate::pattern::find::decode_document;
use crate::pattern::{
    active, bounded, commit, rollback, FindEngineer, InsertEngineer, Tx, UpdateEngineer,
};

pub use find::FindProductBuilder;
pub use insert::InsertProductBuilder;
pub use update::UpdateProductBuilder;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    write_timeout: Duration,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, write_timeout: Duration) -> Self {
        ProductRepository {
            pool,
            write_timeout,
        }
    }

    /// Inserts a product with its category link and images, atomically.
    ///
    /// ## Errors
    /// - `DbError::Invalid` - bad title, price or category id (nothing written)
    /// - `DbError::TransactionFailed` - a step failed, e.g. unknown category
    /// - `DbError::Timeout` - a step exceeded the write budget
    pub async fn insert(&self, product: NewProduct) -> DbResult<String> {
        debug!(title = %product.title, images = product.images.len(), "Inserting product");

        InsertEngineer::new(
            InsertProductBuilder::new(self.pool.clone(), product),
            self.write_timeout,
        )
        .insert()
        .await
    }

    /// Writes the supplied fields; supplied images replace the whole set.
    ///
    /// ## Returns
    /// The images that were replaced (empty when images were not supplied).
    pub async fn update(&self, patch: ProductPatch) -> DbResult<Vec<Image>> {
        debug!(id = %patch.id, "Updating product");

        UpdateEngineer::new(
            UpdateProductBuilder::new(self.pool.clone(), patch),
            self.write_timeout,
        )
        .update()
        .await
    }

    /// Gets a product with its category and images.
    pub async fn find_one(&self, id: &str) -> DbResult<Product> {
        let mut qb: QueryBuilder<'static, Sqlite> = QueryBuilder::new(find::PRODUCT_SELECT);
        qb.push(" WHERE p.id = ").push_bind(id.to_string());

        let document: Option<String> = qb
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await?;

        match document {
            Some(doc) => decode_document("Product", &doc),
            None => Err(DbError::not_found("Product", id)),
        }
    }

    /// Lists one page of products plus the total matching the filter.
    pub async fn find_many(&self, filter: &ProductFilter) -> DbResult<(Vec<Product>, i64)> {
        debug!(page = filter.page.page, limit = filter.page.limit, "Listing products");

        FindEngineer::new(self.pool.clone(), FindProductBuilder::new(filter.clone()))
            .find_with_count()
            .await
    }

    /// Deletes a product; link and image rows go with it.
    ///
    /// ## Returns
    /// The deleted images, so their files can be removed.
    ///
    /// ## Errors
    /// - `DbError::NotFound` - no product with this id (rolled back)
    /// - `DbError::Timeout` - the delete exceeded the write budget (rolled back)
    pub async fn delete(&self, id: &str) -> DbResult<Vec<Image>> {
        let mut tx = Some(self.pool.begin().await?);

        let outcome = match active(&mut tx) {
            Ok(open) => {
                bounded(WriteStep::Delete, self.write_timeout, delete_rows(open, id)).await
            }
            Err(e) => Err(e),
        };
        let images = match outcome {
            Ok(images) => images,
            Err(e) => {
                rollback("Product", &mut tx).await;
                return Err(e);
            }
        };

        bounded(WriteStep::Commit, self.write_timeout, commit(&mut tx)).await?;
        info!(id, images = images.len(), "Product deleted");
        Ok(images)
    }
}

/// Removes the product row and returns the images it owned.
async fn delete_rows(tx: &mut Tx, id: &str) -> DbResult<Vec<Image>> {
    let images: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT id, filename, url FROM images WHERE product_id = ? ORDER BY position",
    )
    .bind(id)
    .fetch_all(&mut **tx)
    .await?;

    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(images
        .into_iter()
        .map(|(id, filename, url)| Image { id, filename, url })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
