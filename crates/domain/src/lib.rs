//! Checkout core for the storefront backend.
//!
//! This crate provides:
//! - Cart validation (exhaustive for checkout preview, fail-fast for
//!   order placement)
//! - Order assembly (integer-only totals, single-currency enforcement)
//! - The `CheckoutService` orchestrating validation, assembly, and the
//!   store's transactional commit
//! - Order history with batched product title resolution

pub mod assemble;
pub mod cart;
pub mod error;
pub mod history;
pub mod service;

pub use assemble::assemble_order;
pub use cart::{CartIssue, CartLine, IssueReason, ResolvedCart, ResolvedLine, resolve_cart, validate_cart};
pub use error::CheckoutError;
pub use history::{OrderItemView, OrderView, build_history};
pub use service::CheckoutService;
