//! Product use-cases.
//!
//! Image files are removed only after the rows that referenced them are
//! gone. A storage failure at that point is reported; the committed rows
//! stay as they are.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use gunpla_core::{Image, NewProduct, PaginateRes, Product, ProductFilter, ProductPatch};
use gunpla_db::ProductRepository;
use tracing::info;

use super::within;
use crate::error::ServiceResult;
use crate::storage::{product_image_path, FileStorage};

/// Product use-cases.
#[derive(Clone)]
pub struct ProductUsecase {
    products: ProductRepository,
    storage: Arc<dyn FileStorage>,
    request_timeout: Duration,
}

impl ProductUsecase {
    pub fn new(
        products: ProductRepository,
        storage: Arc<dyn FileStorage>,
        request_timeout: Duration,
    ) -> Self {
        ProductUsecase {
            products,
            storage,
            request_timeout,
        }
    }

    pub async fn find_one(&self, id: &str) -> ServiceResult<Product> {
        within("find product", self.request_timeout, self.products.find_one(id)).await
    }

    pub async fn find_many(&self, filter: &ProductFilter) -> ServiceResult<PaginateRes<Product>> {
        let (products, total) = within(
            "find products",
            self.request_timeout,
            self.products.find_many(filter),
        )
        .await?;
        Ok(PaginateRes::new(products, filter.page, total))
    }

    pub async fn add(&self, product: NewProduct) -> ServiceResult<Product> {
        let id = self.products.insert(product).await?;
        info!(id = %id, "Product added");
        self.find_one(&id).await
    }

    /// Applies the patch, then removes the files of any replaced images.
    ///
    /// A filename the new image set still uses is kept on disk.
    pub async fn update(&self, patch: ProductPatch) -> ServiceResult<Product> {
        let id = patch.id.clone();
        let kept: HashSet<String> = patch
            .images
            .iter()
            .flatten()
            .map(|image| image.filename.clone())
            .collect();

        let removed = self.products.update(patch).await?;
        let orphaned: Vec<Image> = removed
            .into_iter()
            .filter(|image| !kept.contains(&image.filename))
            .collect();
        self.remove_files(&orphaned).await?;
        self.find_one(&id).await
    }

    /// Deletes the product rows, then their image files.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let removed = self.products.delete(id).await?;
        self.remove_files(&removed).await
    }

    async fn remove_files(&self, images: &[Image]) -> ServiceResult<()> {
        if images.is_empty() {
            return Ok(());
        }
        let paths: Vec<String> = images
            .iter()
            .map(|image| product_image_path(&image.filename))
            .collect();
        self.storage.delete_files(&paths).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
