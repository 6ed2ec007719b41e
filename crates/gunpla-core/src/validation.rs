//! # Validation Module
//!
//! Input validation for aggregate writes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Use-case (gunpla-service)                                    │
//! │  ├── Role policy, product lookup                                       │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Builder::validate (gunpla-db)                                │
//! │  └── THIS MODULE again: runs before BeginTransaction                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gunpla_core::validation::{validate_quantity, validate_title};
//!
//! assert!(validate_title("RX-78-2 Gundam").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewOrder, NewProduct};
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest title accepted for products and categories.
pub const MAX_TITLE_LEN: usize = 200;

/// Longest free-text search term accepted by list filters.
pub const MAX_SEARCH_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product or category title.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(())
}

/// Validates a free-text search term and returns it trimmed.
///
/// Empty is allowed and means "no search predicate".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed.
///
/// ## Example
/// ```rust
/// use gunpla_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(80000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a category id (store-assigned, starts at 1).
pub fn validate_category_id(id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "category_id".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in an order.
///
/// ## Rules
/// - At least one line (an order with no products is never written)
/// - At most MAX_ORDER_LINES (100)
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Empty {
            collection: "products".to_string(),
        });
    }

    if lines > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "products".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates a complete order before any database work.
///
/// ## Flow
/// ```text
/// NewOrder
///    │
///    ├── lines empty?      → Empty { products }
///    ├── user/contact/address blank? → Required
///    ├── any qty <= 0?     → MustBePositive { qty }
///    └── OK → BeginTransaction
/// ```
pub fn validate_new_order(order: &NewOrder) -> ValidationResult<()> {
    validate_line_count(order.lines.len())?;
    validate_required("user_id", &order.user_id)?;
    validate_required("contact", &order.contact)?;
    validate_required("address", &order.address)?;

    for line in &order.lines {
        validate_quantity(line.qty)?;
        validate_required("product.id", &line.product.id)?;
    }

    Ok(())
}

/// Validates a product before any database work.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_title(&product.title)?;
    validate_price_cents(product.price_cents)?;
    validate_category_id(product.category_id)?;

    for image in &product.images {
        validate_required("image.filename", &image.filename)?;
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use gunpla_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewImage, NewOrderLine, Product};
    use chrono::Utc;

    fn line(qty: i64) -> NewOrderLine {
        NewOrderLine {
            qty,
            product: Product {
                id: "p-1".to_string(),
                title: "Zaku II".to_string(),
                description: String::new(),
                price_cents: 1000,
                category: None,
                images: vec![],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    fn order(lines: Vec<NewOrderLine>) -> NewOrder {
        NewOrder {
            user_id: "u-1".to_string(),
            contact: "0800000000".to_string(),
            address: "Bangkok".to_string(),
            status: Default::default(),
            transfer_slip: None,
            total_price_cents: 0,
            lines,
        }
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Zaku II").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_new_order_rejects_empty_lines() {
        let err = validate_new_order(&order(vec![])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Empty {
                collection: "products".to_string()
            }
        );
    }

    #[test]
    fn test_validate_new_order_checks_each_line() {
        assert!(validate_new_order(&order(vec![line(2), line(1)])).is_ok());
        assert!(matches!(
            validate_new_order(&order(vec![line(2), line(0)])),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_validate_new_product() {
        let mut product = NewProduct {
            title: "Zaku II".to_string(),
            description: String::new(),
            price_cents: 45000,
            category_id: 1,
            images: vec![NewImage {
                filename: "zaku.jpg".to_string(),
                url: "/images/products/zaku.jpg".to_string(),
            }],
        };
        assert!(validate_new_product(&product).is_ok());

        product.category_id = 0;
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  zaku ").unwrap(), "zaku");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
