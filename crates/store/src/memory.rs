use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::{OrderId, ProductId};

use crate::records::{
    NewOrder, NewProduct, OrderItemRecord, OrderRecord, Product,
};
use crate::store::CommerceStore;
use crate::{Result, StoreError};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    orders: Vec<OrderRecord>,
    items: Vec<OrderItemRecord>,
    next_product_id: i64,
    next_order_id: i64,
    next_item_id: i64,
    fail_commits: bool,
}

/// In-memory commerce store.
///
/// Backs the test suite and the default (no `DATABASE_URL`) runtime.
/// `commit_order` holds the state write lock for the whole
/// check-and-decrement-and-insert unit, so concurrent commits are
/// serialized and observe each other only in full-before or
/// full-after states.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail commits with a storage error,
    /// for testing rollback behavior.
    pub async fn set_fail_commits(&self, fail: bool) {
        self.state.write().await.fail_commits = fail;
    }

    /// Returns the current stock of a product, if it exists.
    pub async fn stock_of(&self, id: ProductId) -> Option<i64> {
        self.state.read().await.products.get(&id).map(|p| p.stock)
    }

    /// Returns the total number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the total number of persisted order items.
    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }
}

#[async_trait]
impl CommerceStore for InMemoryStore {
    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        state.next_product_id += 1;
        let product = product.into_product(ProductId::new(state.next_product_id));
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<Option<Product>> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&id) {
            return Ok(None);
        }
        let product = product.into_product(id);
        state.products.insert(id, product.clone());
        Ok(Some(product))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.products.remove(&id).is_some())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).map(|p| (*id, p.clone())))
            .collect())
    }

    async fn commit_order(&self, order: NewOrder) -> Result<OrderId> {
        let mut state = self.state.write().await;

        if state.fail_commits {
            return Err(StoreError::Unavailable("injected commit failure".to_string()));
        }

        // Sum demand per product first: a cart may carry the same
        // product on several lines, and the check must see their
        // combined quantity. Checking everything before touching
        // anything also means a failure leaves no partial decrement.
        let mut demand: HashMap<ProductId, i64> = HashMap::new();
        for item in &order.items {
            *demand.entry(item.product_id).or_default() += item.quantity;
        }

        for (&product_id, &requested) in &demand {
            let product = state
                .products
                .get(&product_id)
                .ok_or(StoreError::ProductNotFound(product_id))?;
            if product.stock < requested {
                return Err(StoreError::InsufficientStock {
                    product_id,
                    available: product.stock,
                    requested,
                });
            }
        }

        for (product_id, requested) in demand {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.stock -= requested;
            }
        }

        state.next_order_id += 1;
        let order_id = OrderId::new(state.next_order_id);
        state.orders.push(OrderRecord {
            id: order_id,
            user_email: order.user_email,
            status: order.status,
            total_cents: order.total_cents,
            currency: order.currency,
            created_at: order.created_at,
        });

        for item in order.items {
            state.next_item_id += 1;
            let id = state.next_item_id;
            state.items.push(OrderItemRecord {
                id,
                order_id,
                product_id: item.product_id,
                unit_price_cents: item.unit_price_cents,
                quantity: item.quantity,
            });
        }

        Ok(order_id)
    }

    async fn list_orders(&self, user_email: &str) -> Result<Vec<OrderRecord>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| o.user_email == user_email)
            .cloned()
            .collect();
        // Stable sort: equal timestamps keep insertion order.
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_items(&self, order_ids: &[OrderId]) -> Result<Vec<OrderItemRecord>> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .filter(|it| order_ids.contains(&it.order_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{NewOrderItem, OrderStatus};
    use chrono::Utc;
    use common::Currency;

    fn widget(stock: i64) -> NewProduct {
        NewProduct {
            title: "Widget".to_string(),
            description: Some("A widget".to_string()),
            price_cents: 500,
            currency: Currency::new("USD"),
            stock,
            slug: "widget".to_string(),
        }
    }

    fn order_for(product_id: ProductId, quantity: i64) -> NewOrder {
        NewOrder {
            user_email: "alice@example.com".to_string(),
            status: OrderStatus::Paid,
            total_cents: 500 * quantity,
            currency: Currency::new("USD"),
            created_at: Utc::now(),
            items: vec![NewOrderItem {
                product_id,
                unit_price_cents: 500,
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn product_crud_roundtrip() {
        let store = InMemoryStore::new();

        let created = store.insert_product(widget(3)).await.unwrap();
        assert_eq!(store.get_product(created.id).await.unwrap(), Some(created.clone()));

        let mut update = widget(3);
        update.title = "Better widget".to_string();
        let updated = store.update_product(created.id, update).await.unwrap().unwrap();
        assert_eq!(updated.title, "Better widget");

        assert!(store.delete_product(created.id).await.unwrap());
        assert!(!store.delete_product(created.id).await.unwrap());
        assert_eq!(store.get_product(created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_missing_product_returns_none() {
        let store = InMemoryStore::new();
        let result = store
            .update_product(ProductId::new(99), widget(1))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn get_products_skips_missing_ids() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(3)).await.unwrap();

        let map = store
            .get_products(&[product.id, ProductId::new(99)])
            .await
            .unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&product.id));
    }

    #[tokio::test]
    async fn commit_decrements_stock_and_persists_order() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(3)).await.unwrap();

        let order_id = store.commit_order(order_for(product.id, 2)).await.unwrap();

        assert_eq!(store.stock_of(product.id).await, Some(1));
        let orders = store.list_orders("alice@example.com").await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order_id);
        assert_eq!(orders[0].total_cents, 1000);

        let items = store.list_items(&[order_id]).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].unit_price_cents, 500);
    }

    #[tokio::test]
    async fn commit_fails_without_decrement_when_stock_short() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(3)).await.unwrap();

        let err = store.commit_order(order_for(product.id, 5)).await.unwrap_err();
        match err {
            StoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(store.stock_of(product.id).await, Some(3));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn failed_multi_line_commit_leaves_no_partial_decrement() {
        let store = InMemoryStore::new();
        let a = store.insert_product(widget(3)).await.unwrap();
        let b = store.insert_product(widget(1)).await.unwrap();

        let mut order = order_for(a.id, 2);
        order.items.push(NewOrderItem {
            product_id: b.id,
            unit_price_cents: 500,
            quantity: 5,
        });

        assert!(store.commit_order(order).await.is_err());
        assert_eq!(store.stock_of(a.id).await, Some(3));
        assert_eq!(store.stock_of(b.id).await, Some(1));
    }

    #[tokio::test]
    async fn duplicate_lines_for_same_product_check_combined_demand() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(3)).await.unwrap();

        // Two lines of 2 against stock 3: each line alone fits, their
        // sum does not. The commit must fail without touching stock.
        let mut order = order_for(product.id, 2);
        order.items.push(NewOrderItem {
            product_id: product.id,
            unit_price_cents: 500,
            quantity: 2,
        });

        let err = store.commit_order(order).await.unwrap_err();
        match err {
            StoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 4);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(store.stock_of(product.id).await, Some(3));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_lines_within_stock_decrement_the_sum() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(5)).await.unwrap();

        let mut order = order_for(product.id, 2);
        order.items.push(NewOrderItem {
            product_id: product.id,
            unit_price_cents: 500,
            quantity: 2,
        });

        let order_id = store.commit_order(order).await.unwrap();

        assert_eq!(store.stock_of(product.id).await, Some(1));
        // Both lines persist as submitted.
        let items = store.list_items(&[order_id]).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|it| it.quantity == 2));
    }

    #[tokio::test]
    async fn commit_missing_product_fails() {
        let store = InMemoryStore::new();
        let err = store
            .commit_order(order_for(ProductId::new(42), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ProductNotFound(id) if id == ProductId::new(42)));
    }

    #[tokio::test]
    async fn injected_failure_persists_nothing() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(3)).await.unwrap();
        store.set_fail_commits(true).await;

        let err = store.commit_order(order_for(product.id, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.stock_of(product.id).await, Some(3));
        assert_eq!(store.order_count().await, 0);

        store.set_fail_commits(false).await;
        assert!(store.commit_order(order_for(product.id, 1)).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_commits_never_oversell() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(3)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = store.clone();
            let id = product.id;
            handles.push(tokio::spawn(async move {
                store.commit_order(order_for(id, 2)).await
            }));
        }

        let mut ok = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(StoreError::InsufficientStock { .. }) => short += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        // Combined demand (4) exceeds stock (3): exactly one commit wins.
        assert_eq!(ok, 1);
        assert_eq!(short, 1);
        assert_eq!(store.stock_of(product.id).await, Some(1));
    }

    #[tokio::test]
    async fn concurrent_commits_within_stock_all_succeed() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(6)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let store = store.clone();
            let id = product.id;
            handles.push(tokio::spawn(async move {
                store.commit_order(order_for(id, 2)).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.stock_of(product.id).await, Some(0));
    }

    #[tokio::test]
    async fn list_orders_newest_first_stable() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(100)).await.unwrap();

        let t0 = Utc::now();
        let mut first = order_for(product.id, 1);
        first.created_at = t0;
        let mut second = order_for(product.id, 1);
        second.created_at = t0;
        let mut newer = order_for(product.id, 1);
        newer.created_at = t0 + chrono::Duration::seconds(10);

        let id_first = store.commit_order(first).await.unwrap();
        let id_second = store.commit_order(second).await.unwrap();
        let id_newer = store.commit_order(newer).await.unwrap();

        let orders = store.list_orders("alice@example.com").await.unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![id_newer, id_first, id_second]);
    }

    #[tokio::test]
    async fn list_orders_scoped_to_user() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(10)).await.unwrap();

        store.commit_order(order_for(product.id, 1)).await.unwrap();
        let mut other = order_for(product.id, 1);
        other.user_email = "bob@example.com".to_string();
        store.commit_order(other).await.unwrap();

        assert_eq!(store.list_orders("alice@example.com").await.unwrap().len(), 1);
        assert_eq!(store.list_orders("bob@example.com").await.unwrap().len(), 1);
        assert!(store.list_orders("carol@example.com").await.unwrap().is_empty());
    }
}
