//! List reads for products.

use gunpla_core::query::{Pagination, ProductFilter, ProductSortColumn};
use gunpla_core::Product;

use crate::pattern::{like_pattern, Filter, FindBuilder, OrderClause};

/// One JSON document per product: category object (or null) and images
/// in position order.
pub(crate) const PRODUCT_SELECT: &str = r#"
    SELECT json_object(
        'id', p.id,
        'title', p.title,
        'description', p.description,
        'price_cents', p.price_cents,
        'category', json((
            SELECT json_object('id', c.id, 'title', c.title)
            FROM products_categories pc
            JOIN categories c ON c.id = pc.category_id
            WHERE pc.product_id = p.id
        )),
        'images', json((
            SELECT json_group_array(
                json_object('id', i.id, 'filename', i.filename, 'url', i.url)
                ORDER BY i.position
            )
            FROM images i
            WHERE i.product_id = p.id
        )),
        'created_at', p.created_at,
        'updated_at', p.updated_at
    ) AS document
    FROM products p"#;

const PRODUCT_COUNT: &str = "SELECT COUNT(*) FROM products p";

fn sort_column(column: ProductSortColumn) -> &'static str {
    match column {
        ProductSortColumn::Id => "p.id",
        ProductSortColumn::Title => "p.title",
        ProductSortColumn::Price => "p.price_cents",
        ProductSortColumn::CreatedAt => "p.created_at",
    }
}

/// Filters: exact id, search (title/description), category.
pub struct FindProductBuilder {
    filter: ProductFilter,
}

impl FindProductBuilder {
    pub fn new(filter: ProductFilter) -> Self {
        FindProductBuilder { filter }
    }
}

impl FindBuilder for FindProductBuilder {
    type Item = Product;

    fn entity(&self) -> &'static str {
        "Product"
    }

    fn select_sql(&self) -> &'static str {
        PRODUCT_SELECT
    }

    fn count_sql(&self) -> &'static str {
        PRODUCT_COUNT
    }

    fn filter(&self) -> Filter {
        let f = &self.filter;
        let mut filter = Filter::new();

        if let Some(id) = &f.id {
            filter.and("p.id = ?", vec![id.clone().into()]);
        }
        if let Some(search) = &f.search {
            let pattern = like_pattern(search);
            filter.and(
                r"(LOWER(p.title) LIKE ? ESCAPE '\' OR LOWER(p.description) LIKE ? ESCAPE '\')",
                vec![pattern.clone().into(), pattern.into()],
            );
        }
        if let Some(category_id) = f.category_id {
            filter.and(
                "EXISTS (SELECT 1 FROM products_categories pc WHERE pc.product_id = p.id AND pc.category_id = ?)",
                vec![category_id.into()],
            );
        }

        filter
    }

    fn order_clause(&self) -> OrderClause {
        OrderClause {
            column: sort_column(self.filter.sort.column),
            direction: self.filter.sort.direction,
            tiebreak: Some("p.id"),
        }
    }

    fn pagination(&self) -> Pagination {
        self.filter.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gunpla_core::query::{Sort, SortRequest};

    #[test]
    fn test_category_filter_uses_exists() {
        let builder = FindProductBuilder::new(ProductFilter {
            category_id: Some(3),
            sort: Sort::resolve(&SortRequest::new("price", "asc")),
            ..Default::default()
        });

        let sql = builder.find_query().sql().to_string();
        assert!(sql.contains("WHERE EXISTS (SELECT 1 FROM products_categories pc"));
        assert!(sql.ends_with("ORDER BY p.price_cents ASC, p.id ASC LIMIT ? OFFSET ?"));
    }

    #[test]
    fn test_sort_by_id_has_no_duplicate_tiebreak() {
        let builder = FindProductBuilder::new(ProductFilter {
            sort: Sort::resolve(&SortRequest::new("id", "asc")),
            ..Default::default()
        });
        assert!(builder
            .find_query()
            .sql()
            .ends_with("FROM products p ORDER BY p.id ASC LIMIT ? OFFSET ?"));
    }
}
