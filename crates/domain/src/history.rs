//! Order history views.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{Currency, OrderId, ProductId};
use store::{OrderItemRecord, OrderRecord, OrderStatus, Product};

/// One line of a historical order as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Current catalog title, resolved at query time. `None` when the
    /// product has since been deleted; the order stays readable.
    pub title: Option<String>,
}

/// A historical order with its nested line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub user_email: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// Joins orders, their items, and current product titles into views.
///
/// Order ordering is taken from `orders` as-is (the store already
/// returns newest-first); items keep the store's item order.
pub fn build_history(
    orders: Vec<OrderRecord>,
    items: Vec<OrderItemRecord>,
    products: &HashMap<ProductId, Product>,
) -> Vec<OrderView> {
    let mut items_by_order: HashMap<OrderId, Vec<OrderItemView>> = HashMap::new();
    for item in items {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItemView {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
                title: products.get(&item.product_id).map(|p| p.title.clone()),
            });
    }

    orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderView {
                id: order.id,
                user_email: order.user_email,
                status: order.status,
                total_cents: order.total_cents,
                currency: order.currency,
                created_at: order.created_at,
                items,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i64) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(id),
            user_email: "alice@example.com".to_string(),
            status: OrderStatus::Paid,
            total_cents: 1000,
            currency: Currency::new("USD"),
            created_at: Utc::now(),
        }
    }

    fn item(id: i64, order_id: i64, product_id: i64) -> OrderItemRecord {
        OrderItemRecord {
            id,
            order_id: OrderId::new(order_id),
            product_id: ProductId::new(product_id),
            unit_price_cents: 500,
            quantity: 2,
        }
    }

    fn product(id: i64, title: &str) -> (ProductId, Product) {
        (
            ProductId::new(id),
            Product {
                id: ProductId::new(id),
                title: title.to_string(),
                description: None,
                price_cents: 999,
                currency: Currency::new("USD"),
                stock: 1,
                slug: title.to_lowercase(),
            },
        )
    }

    #[test]
    fn groups_items_under_their_orders() {
        let products: HashMap<_, _> = vec![product(1, "Widget")].into_iter().collect();
        let views = build_history(
            vec![order(10), order(11)],
            vec![item(1, 10, 1), item(2, 11, 1), item(3, 10, 1)],
            &products,
        );

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].items.len(), 2);
        assert_eq!(views[1].items.len(), 1);
        assert_eq!(views[0].items[0].title.as_deref(), Some("Widget"));
    }

    #[test]
    fn deleted_product_title_is_none() {
        let products = HashMap::new();
        let views = build_history(vec![order(10)], vec![item(1, 10, 42)], &products);

        assert_eq!(views[0].items[0].title, None);
        // The snapshot survives even though the product is gone.
        assert_eq!(views[0].items[0].unit_price_cents, 500);
    }

    #[test]
    fn order_without_items_has_empty_list() {
        let views = build_history(vec![order(10)], vec![], &HashMap::new());
        assert!(views[0].items.is_empty());
    }

    #[test]
    fn created_at_serializes_iso8601() {
        let views = build_history(vec![order(10)], vec![], &HashMap::new());
        let json = serde_json::to_value(&views[0]).unwrap();
        let created_at = json["created_at"].as_str().unwrap();
        assert!(created_at.contains('T'));
        assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
    }
}
