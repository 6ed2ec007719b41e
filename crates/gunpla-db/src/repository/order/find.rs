//! List reads for orders.

use gunpla_core::query::{OrderFilter, OrderSortColumn, Pagination};
use gunpla_core::Order;

use crate::pattern::{like_pattern, Filter, FindBuilder, OrderClause};

/// One JSON document per order, lines nested in position order.
pub(crate) const ORDER_SELECT: &str = r#"
    SELECT json_object(
        'id', o.id,
        'user_id', o.user_id,
        'contact', o.contact,
        'address', o.address,
        'status', o.status,
        'total_price_cents', o.total_price_cents,
        'transfer_slip', json(o.transfer_slip),
        'products', json((
            SELECT json_group_array(
                json_object('id', po.id, 'qty', po.qty, 'product', json(po.product))
                ORDER BY po.position
            )
            FROM products_orders po
            WHERE po.order_id = o.id
        )),
        'created_at', o.created_at,
        'updated_at', o.updated_at
    ) AS document
    FROM orders o"#;

const ORDER_COUNT: &str = "SELECT COUNT(*) FROM orders o";

/// Allow-listed sort column → SQL column.
fn sort_column(column: OrderSortColumn) -> &'static str {
    match column {
        OrderSortColumn::Id => "o.id",
        OrderSortColumn::CreatedAt => "o.created_at",
    }
}

/// Filters: search (id/contact/address), status, owner, date range.
pub struct FindOrderBuilder {
    filter: OrderFilter,
}

impl FindOrderBuilder {
    pub fn new(filter: OrderFilter) -> Self {
        FindOrderBuilder { filter }
    }
}

impl FindBuilder for FindOrderBuilder {
    type Item = Order;

    fn entity(&self) -> &'static str {
        "Order"
    }

    fn select_sql(&self) -> &'static str {
        ORDER_SELECT
    }

    fn count_sql(&self) -> &'static str {
        ORDER_COUNT
    }

    fn filter(&self) -> Filter {
        let f = &self.filter;
        let mut filter = Filter::new();

        if let Some(search) = &f.search {
            let pattern = like_pattern(search);
            filter.and(
                r"(LOWER(o.id) LIKE ? ESCAPE '\' OR LOWER(o.contact) LIKE ? ESCAPE '\' OR LOWER(o.address) LIKE ? ESCAPE '\')",
                vec![pattern.clone().into(), pattern.clone().into(), pattern.into()],
            );
        }
        if let Some(status) = f.status {
            filter.and("o.status = ?", vec![status.as_str().into()]);
        }
        if let Some(user_id) = &f.user_id {
            filter.and("o.user_id = ?", vec![user_id.clone().into()]);
        }
        if let Some(start) = f.start_date {
            filter.and(
                "date(o.created_at) >= ?",
                vec![start.format("%Y-%m-%d").to_string().into()],
            );
        }
        if let Some(end) = f.end_date {
            filter.and(
                "date(o.created_at) <= ?",
                vec![end.format("%Y-%m-%d").to_string().into()],
            );
        }

        filter
    }

    fn order_clause(&self) -> OrderClause {
        OrderClause {
            column: sort_column(self.filter.sort.column),
            direction: self.filter.sort.direction,
            tiebreak: Some("o.id"),
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
    use gunpla_core::OrderStatus;

    #[test]
    fn test_find_query_shape() {
        let builder = FindOrderBuilder::new(OrderFilter {
            search: Some("bang".to_string()),
            status: Some(OrderStatus::Waiting),
            page: Pagination::clamped(2, 10),
            sort: Sort::resolve(&SortRequest::new("created_at", "asc")),
            ..Default::default()
        });

        let find = builder.find_query();
        let sql = find.sql();
        assert!(sql.contains("WHERE (LOWER(o.id) LIKE ?"));
        assert!(sql.contains("AND o.status = ?"));
        assert!(sql.ends_with("ORDER BY o.created_at ASC, o.id ASC LIMIT ? OFFSET ?"));
        assert!(!sql.contains("bang"));

        let count = builder.count_query();
        assert!(count.sql().starts_with("SELECT COUNT(*) FROM orders o WHERE"));
        assert!(!count.sql().contains("ORDER BY"));
        assert!(!count.sql().contains("LIMIT"));
    }

    #[test]
    fn test_unknown_sort_uses_id_desc() {
        let builder = FindOrderBuilder::new(OrderFilter {
            sort: Sort::resolve(&SortRequest::new("droptable", "sideways")),
            ..Default::default()
        });
        assert!(builder
            .find_query()
            .sql()
            .ends_with("FROM orders o ORDER BY o.id DESC LIMIT ? OFFSET ?"));
    }
}
