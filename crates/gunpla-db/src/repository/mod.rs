//! # Repository Module
//!
//! The external persistence interface, one repository per aggregate.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository → Builder → Engineer                      │
//! │                                                                         │
//! │  Use-case                                                              │
//! │       │  db.orders().insert(new_order)                                 │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── insert(&self, NewOrder)     → InsertEngineer(InsertOrderBuilder)  │
//! │  ├── update(&self, &OrderPatch)  → single UPDATE, supplied columns     │
//! │  ├── find_one(&self, id)         → one JSON document                   │
//! │  └── find_many(&self, &filter)   → FindEngineer(FindOrderBuilder)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  The repository only chooses the Builder. The Engineer owns the        │
//! │  protocol, so every aggregate gets the same rollback/timeout rules.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OrderRepository`](order::OrderRepository) - Orders with their product lines
//! - [`ProductRepository`](product::ProductRepository) - Products with category and images
//! - [`CategoryRepository`](category::CategoryRepository) - Category reference data

pub mod category;
pub mod order;
pub mod product;

/// RFC 3339 UTC "now" with millisecond precision, as stored in every
/// `created_at` / `updated_at` column.
pub(crate) const SQL_NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

#[cfg(test)]
pub(crate) mod test_support {
    use gunpla_core::{NewImage, NewOrder, NewOrderLine, NewProduct, OrderStatus, Product};

    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Inserts a category and returns its id.
    pub async fn category(db: &Database, title: &str) -> i64 {
        db.categories()
            .insert(&[title.to_string()])
            .await
            .unwrap()[0]
            .id
    }

    pub fn new_product(title: &str, price_cents: i64, category_id: i64) -> NewProduct {
        NewProduct {
            title: title.to_string(),
            description: format!("{} model kit", title),
            price_cents,
            category_id,
            images: vec![
                NewImage {
                    filename: format!("{}-box.jpg", title.to_lowercase()),
                    url: format!("/images/products/{}-box.jpg", title.to_lowercase()),
                },
                NewImage {
                    filename: format!("{}-runner.jpg", title.to_lowercase()),
                    url: format!("/images/products/{}-runner.jpg", title.to_lowercase()),
                },
            ],
        }
    }

    /// Inserts a product and returns it as stored.
    pub async fn product(db: &Database, title: &str, price_cents: i64, category_id: i64) -> Product {
        let id = db
            .products()
            .insert(new_product(title, price_cents, category_id))
            .await
            .unwrap();
        db.products().find_one(&id).await.unwrap()
    }

    pub fn new_order(user_id: &str, lines: Vec<(i64, Product)>) -> NewOrder {
        let total = lines.iter().map(|(qty, p)| qty * p.price_cents).sum();
        NewOrder {
            user_id: user_id.to_string(),
            contact: "081-234-5678".to_string(),
            address: "99 Sukhumvit Rd, Bangkok".to_string(),
            status: OrderStatus::Waiting,
            transfer_slip: None,
            total_price_cents: total,
            lines: lines
                .into_iter()
                .map(|(qty, product)| NewOrderLine { qty, product })
                .collect(),
        }
    }
}
