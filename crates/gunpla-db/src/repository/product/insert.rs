//! Staged insert of a product, its category link and its images.

use async_trait::async_trait;
use gunpla_core::validation::validate_new_product;
use gunpla_core::{NewProduct, ValidationError};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};
use crate::pattern::{self, InsertBuilder, Tx};

/// Writes `products`, then the `products_categories` link and one batched
/// `images` insert.
///
/// The link row is always written, so a product never commits childless;
/// the image batch is skipped when there are no images.
pub struct InsertProductBuilder {
    pool: SqlitePool,
    product: NewProduct,
    tx: Option<Tx>,
    product_id: Option<String>,
}

impl InsertProductBuilder {
    pub fn new(pool: SqlitePool, product: NewProduct) -> Self {
        InsertProductBuilder {
            pool,
            product,
            tx: None,
            product_id: None,
        }
    }
}

#[async_trait]
impl InsertBuilder for InsertProductBuilder {
    fn entity(&self) -> &'static str {
        "Product"
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_new_product(&self.product)
    }

    async fn begin(&mut self) -> DbResult<()> {
        self.tx = Some(self.pool.begin().await?);
        Ok(())
    }

    async fn insert_parent(&mut self) -> DbResult<()> {
        let tx = pattern::active(&mut self.tx)?;
        let product = &self.product;

        let id: String = sqlx::query_scalar(
            "INSERT INTO products (title, description, price_cents) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(product.title.trim())
        .bind(&product.description)
        .bind(product.price_cents)
        .fetch_one(&mut **tx)
        .await?;

        self.product_id = Some(id);
        Ok(())
    }

    async fn insert_children(&mut self) -> DbResult<()> {
        let product_id = self
            .product_id
            .clone()
            .ok_or_else(|| DbError::Internal("product id missing before children".to_string()))?;
        let tx = pattern::active(&mut self.tx)?;

        sqlx::query("INSERT INTO products_categories (product_id, category_id) VALUES (?, ?)")
            .bind(&product_id)
            .bind(self.product.category_id)
            .execute(&mut **tx)
            .await?;

        if self.product.images.is_empty() {
            return Ok(());
        }

        insert_images(tx, &product_id, &self.product.images).await
    }

    async fn commit(&mut self) -> DbResult<()> {
        pattern::commit(&mut self.tx).await
    }

    async fn rollback(&mut self) {
        pattern::rollback(self.entity(), &mut self.tx).await;
    }

    fn identifier(&self) -> Option<&str> {
        self.product_id.as_deref()
    }
}

/// One batched insert of `images`, positions in slice order.
pub(super) async fn insert_images(
    tx: &mut Tx,
    product_id: &str,
    images: &[gunpla_core::NewImage],
) -> DbResult<()> {
    let mut qb: QueryBuilder<'static, Sqlite> =
        QueryBuilder::new("INSERT INTO images (product_id, position, filename, url) ");
    qb.push_values(images.iter().enumerate(), |mut row, (position, image)| {
        row.push_bind(product_id.to_string())
            .push_bind(position as i64)
            .push_bind(image.filename.clone())
            .push_bind(image.url.clone());
    });

    qb.build().execute(&mut **tx).await?;
    Ok(())
}
