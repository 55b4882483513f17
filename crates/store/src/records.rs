//! Record types persisted by the commerce store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{Currency, OrderId, ProductId};

/// A catalog product as stored in inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    /// Price in cents to avoid floating point issues.
    pub price_cents: i64,
    pub currency: Currency,
    /// Available sellable units. Never negative; only
    /// `commit_order` decrements it.
    pub stock: i64,
    /// URL-friendly unique identifier.
    pub slug: String,
}

/// Payload for creating or fully updating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub currency: Currency,
    pub stock: i64,
    pub slug: String,
}

impl NewProduct {
    /// Attaches an id, producing a full product record.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            title: self.title,
            description: self.description,
            price_cents: self.price_cents,
            currency: self.currency,
            stock: self.stock,
            slug: self.slug,
        }
    }
}

/// Order status lifecycle.
///
/// Checkout only ever writes `Paid`; the other states exist for a
/// future payment integration to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Paid,
    Pending,
    Cancelled,
}

impl OrderStatus {
    /// Returns the status as its stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Paid => "paid",
            OrderStatus::Pending => "pending",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "paid" => Ok(OrderStatus::Paid),
            "pending" => Ok(OrderStatus::Pending),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// A persisted order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_email: String,
    pub status: OrderStatus,
    /// Exact integer sum of `unit_price_cents * quantity` over the items.
    pub total_cents: i64,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

/// A line item of a persisted order.
///
/// `unit_price_cents` is a snapshot taken at order time; later product
/// price changes or deletion do not affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

/// An assembled order ready to be committed atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_email: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub items: Vec<NewOrderItem>,
}

/// One line of a [`NewOrder`]: the quantity doubles as the amount of
/// stock the commit engine must decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub unit_price_cents: i64,
    pub quantity: i64,
}
