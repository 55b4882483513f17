//! Checkout error taxonomy.

use thiserror::Error;

use common::{Currency, ProductId};
use store::StoreError;

/// Errors that can occur during checkout operations.
///
/// All variants are terminal for the current request; only `Storage`
/// is retryable by resubmitting the cart.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A requested quantity was not a positive integer.
    #[error("Invalid quantity for product {product_id}")]
    InvalidQuantity { product_id: ProductId },

    /// The submitted cart had no lines.
    #[error("Empty cart")]
    EmptyCart,

    /// A cart line referenced a product absent from inventory.
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),

    /// Requested quantity exceeds available stock.
    #[error("Not enough stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// A cart line's currency differed from the order currency
    /// established by the first line.
    #[error("Mixed currencies are not supported: order is {expected}, product {product_id} is {found}")]
    MixedCurrency {
        expected: Currency,
        found: Currency,
        product_id: ProductId,
    },

    /// The order total overflowed the supported integer range.
    #[error("Order total exceeds the supported range")]
    TotalOverflow,

    /// The persistence layer failed. The whole operation rolled back;
    /// the caller may retry with a fresh cart.
    #[error("Storage failure: {0}")]
    Storage(StoreError),
}

impl CheckoutError {
    /// True if the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::Storage(_))
    }
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        // Commit-time re-checks surface the same taxonomy as
        // validation-time failures.
        match err {
            StoreError::ProductNotFound(id) => CheckoutError::ProductNotFound(id),
            StoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => CheckoutError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            other => CheckoutError::Storage(other),
        }
    }
}
