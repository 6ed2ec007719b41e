//! Authoritative product lookup for order lines.

use async_trait::async_trait;
use gunpla_core::{CoreError, Product};
use gunpla_db::ProductRepository;

use crate::error::ServiceResult;

/// Resolves the current stored product for an id.
///
/// An unknown id is `CoreError::ProductNotFound`.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn find_product(&self, id: &str) -> ServiceResult<Product>;
}

#[async_trait]
impl ProductLookup for ProductRepository {
    async fn find_product(&self, id: &str) -> ServiceResult<Product> {
        match self.find_one(id).await {
            Ok(product) => Ok(product),
            Err(e) if e.is_not_found() => Err(CoreError::ProductNotFound(id.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }
}
