use thiserror::Error;

use common::ProductId;

/// Errors that can occur when interacting with the commerce store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced product does not exist.
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),

    /// The commit-time stock re-check found less stock than requested.
    #[error("Not enough stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// The store could not serve the request (pool exhausted, injected
    /// test failure). Retryable by the caller.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
