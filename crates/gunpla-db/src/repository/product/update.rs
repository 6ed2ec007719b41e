//! Staged partial update of a product.

use async_trait::async_trait;
use gunpla_core::validation::{validate_category_id, validate_price_cents, validate_title};
use gunpla_core::{Image, ProductPatch, ValidationError};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::insert::insert_images;
use crate::error::{DbError, DbResult};
use crate::pattern::{self, Tx, UpdateBuilder};
use crate::repository::SQL_NOW;

/// Parent: `UPDATE products SET <supplied>, updated_at`.
/// Children: replace the category link and/or the whole image set.
///
/// Output is the image rows that were replaced, so their files can be
/// removed after the commit.
pub struct UpdateProductBuilder {
    pool: SqlitePool,
    patch: ProductPatch,
    tx: Option<Tx>,
    removed: Vec<Image>,
}

impl UpdateProductBuilder {
    pub fn new(pool: SqlitePool, patch: ProductPatch) -> Self {
        UpdateProductBuilder {
            pool,
            patch,
            tx: None,
            removed: Vec::new(),
        }
    }
}

#[async_trait]
impl UpdateBuilder for UpdateProductBuilder {
    type Output = Vec<Image>;

    fn entity(&self) -> &'static str {
        "Product"
    }

    fn target(&self) -> &str {
        &self.patch.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.patch.id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "id".to_string(),
            });
        }
        if let Some(title) = &self.patch.title {
            validate_title(title)?;
        }
        if let Some(price) = self.patch.price_cents {
            validate_price_cents(price)?;
        }
        if let Some(category_id) = self.patch.category_id {
            validate_category_id(category_id)?;
        }
        Ok(())
    }

    async fn begin(&mut self) -> DbResult<()> {
        self.tx = Some(self.pool.begin().await?);
        Ok(())
    }

    async fn update_parent(&mut self) -> DbResult<()> {
        let patch = &self.patch;

        let mut qb: QueryBuilder<'static, Sqlite> = QueryBuilder::new("UPDATE products SET ");
        let mut set = qb.separated(", ");
        if let Some(title) = &patch.title {
            set.push("title = ").push_bind_unseparated(title.trim().to_string());
        }
        if let Some(description) = &patch.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(price) = patch.price_cents {
            set.push("price_cents = ").push_bind_unseparated(price);
        }
        set.push("updated_at = ").push_unseparated(SQL_NOW);
        qb.push(" WHERE id = ").push_bind(patch.id.clone());

        let tx = pattern::active(&mut self.tx)?;
        let result = qb.build().execute(&mut **tx).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &self.patch.id));
        }
        Ok(())
    }

    async fn update_children(&mut self) -> DbResult<()> {
        let tx = pattern::active(&mut self.tx)?;
        let patch = &self.patch;

        if let Some(category_id) = patch.category_id {
            sqlx::query("DELETE FROM products_categories WHERE product_id = ?")
                .bind(&patch.id)
                .execute(&mut **tx)
                .await?;
            sqlx::query("INSERT INTO products_categories (product_id, category_id) VALUES (?, ?)")
                .bind(&patch.id)
                .bind(category_id)
                .execute(&mut **tx)
                .await?;
        }

        if let Some(images) = &patch.images {
            let old: Vec<(String, String, String)> = sqlx::query_as(
                "SELECT id, filename, url FROM images WHERE product_id = ? ORDER BY position",
            )
            .bind(&patch.id)
            .fetch_all(&mut **tx)
            .await?;

            sqlx::query("DELETE FROM images WHERE product_id = ?")
                .bind(&patch.id)
                .execute(&mut **tx)
                .await?;

            if !images.is_empty() {
                insert_images(tx, &patch.id, images).await?;
            }

            self.removed = old
                .into_iter()
                .map(|(id, filename, url)| Image { id, filename, url })
                .collect();
        }

        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        pattern::commit(&mut self.tx).await
    }

    async fn rollback(&mut self) {
        pattern::rollback(self.entity(), &mut self.tx).await;
    }

    fn into_output(self) -> Vec<Image> {
        self.removed
    }
}
