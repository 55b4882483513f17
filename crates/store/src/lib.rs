//! Persistence layer for the storefront backend.
//!
//! Exposes the [`CommerceStore`] trait with two implementations:
//! an in-memory store used for tests and the default runtime, and a
//! PostgreSQL store. Stock is only ever mutated inside
//! [`CommerceStore::commit_order`], which is the transactional commit
//! engine for order placement.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    NewOrder, NewOrderItem, NewProduct, OrderItemRecord, OrderRecord, OrderStatus, Product,
};
pub use store::CommerceStore;
