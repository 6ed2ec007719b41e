//! # gunpla-service: Use-case Layer for Gunpla Shop
//!
//! Wires the repositories to their collaborators and applies the rules
//! that need more than one table: price derivation, role policy on order
//! status, media cleanup after deletes.
//!
//! ## Startup Sequence
//! ```text
//! ShopConfig::load()          (environment)
//!      │
//!      ▼
//! logging::init()             (RUST_LOG)
//!      │
//!      ▼
//! Shop::open(&config)
//!      ├── Database::new      (pool + migrations)
//!      ├── AccessPolicy       (role_count, admin role)
//!      ├── LocalFileStorage   (file_root)
//!      └── OrderUsecase / ProductUsecase
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod storage;
pub mod usecase;

use std::sync::Arc;

use gunpla_db::Database;

pub use auth::{AccessPolicy, Actor};
pub use config::{ConfigError, ShopConfig};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use lookup::ProductLookup;
pub use storage::{FileStorage, LocalFileStorage};
pub use usecase::{OrderUsecase, ProductUsecase};

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct Shop {
    pub db: Database,
    pub orders: OrderUsecase,
    pub products: ProductUsecase,
}

impl Shop {
    pub async fn open(config: &ShopConfig) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;
        let policy = AccessPolicy::from_config(config)?;
        let storage = Arc::new(LocalFileStorage::new(&config.file_root));

        let orders = OrderUsecase::new(
            db.orders(),
            Arc::new(db.products()),
            policy,
            config.request_timeout(),
        );
        let products = ProductUsecase::new(db.products(), storage, config.request_timeout());

        Ok(Shop {
            db,
            orders,
            products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_with_file_database() {
        logging::init_test();
        let dir = tempfile::tempdir().unwrap();
        let config = ShopConfig {
            database_path: dir.path().join("shop.db"),
            file_root: dir.path().to_path_buf(),
            ..Default::default()
        };

        let shop = Shop::open(&config).await.unwrap();

        assert!(shop.db.health_check().await);
        let page = shop
            .products
            .find_many(&gunpla_core::ProductFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total_item, 0);
        shop.db.close().await;
    }
}
