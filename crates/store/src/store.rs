use std::collections::HashMap;

use async_trait::async_trait;

use common::{OrderId, ProductId};

use crate::records::{NewOrder, NewProduct, OrderItemRecord, OrderRecord, Product};
use crate::Result;

/// Core trait for commerce store implementations.
///
/// The store is the single shared mutable resource of the system.
/// All implementations must be thread-safe (Send + Sync). Product
/// stock may only be mutated through [`CommerceStore::commit_order`].
#[async_trait]
pub trait CommerceStore: Send + Sync {
    /// Inserts a new product, returning it with its assigned id.
    async fn insert_product(&self, product: NewProduct) -> Result<Product>;

    /// Replaces all attributes of an existing product.
    ///
    /// Returns None if the product does not exist.
    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<Option<Product>>;

    /// Deletes a product. Returns false if it did not exist.
    ///
    /// Historical order items keep their price snapshot and keep
    /// referencing the deleted id.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Retrieves a single product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists the whole catalog.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Retrieves a batch of products in one round trip.
    ///
    /// Ids absent from inventory are simply missing from the map.
    async fn get_products(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>>;

    /// Commits an assembled order as a single atomic unit:
    ///
    /// 1. Re-checks each product's current stock against the requested
    ///    quantity (the validation done before assembly may be stale).
    /// 2. Decrements stock per item.
    /// 3. Inserts the order and its items with the generated order id.
    ///
    /// Concurrent commits touching the same product serialize around
    /// the check-and-decrement, so combined demand can never push
    /// stock below zero. On any failure nothing is persisted.
    ///
    /// Returns the new order's id.
    async fn commit_order(&self, order: NewOrder) -> Result<OrderId>;

    /// Returns a user's orders, newest first.
    ///
    /// Orders with identical timestamps keep their insertion order.
    async fn list_orders(&self, user_email: &str) -> Result<Vec<OrderRecord>>;

    /// Returns the line items of a batch of orders in one round trip.
    async fn list_items(&self, order_ids: &[OrderId]) -> Result<Vec<OrderItemRecord>>;
}
