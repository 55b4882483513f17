//! Checkout service orchestrating validation, assembly, and commit.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;

use common::{OrderId, ProductId};
use store::CommerceStore;

use crate::assemble::assemble_order;
use crate::cart::{CartIssue, CartLine, resolve_cart, validate_cart};
use crate::error::CheckoutError;
use crate::history::{OrderView, build_history};

/// High-level checkout API over a commerce store.
///
/// Stock is never mutated here; the store's `commit_order` owns the
/// atomic check-and-decrement. This service performs the early
/// validation, total computation, and the read-side queries.
#[derive(Clone)]
pub struct CheckoutService<S> {
    store: S,
}

impl<S: CommerceStore> CheckoutService<S> {
    /// Creates a new checkout service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates a cart against current inventory without placing an
    /// order. Collects every problem instead of stopping at the first
    /// so the client can show the user the whole picture.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn preview_cart(&self, lines: &[CartLine]) -> Result<Vec<CartIssue>, CheckoutError> {
        for line in lines {
            line.check_quantity()?;
        }

        let inventory = self.store.get_products(&product_ids(lines)).await?;
        Ok(validate_cart(lines, &inventory))
    }

    /// Places an order: fail-fast validation, assembly, and the
    /// store's atomic commit. The commit re-checks stock under its own
    /// serialization, so a cart that passes validation here can still
    /// lose the race and come back as `InsufficientStock`.
    ///
    /// Returns the new order's id.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn place_order(
        &self,
        user_email: &str,
        lines: &[CartLine],
    ) -> Result<OrderId, CheckoutError> {
        let started = Instant::now();

        if lines.is_empty() {
            metrics::counter!("orders_rejected_total").increment(1);
            return Err(CheckoutError::EmptyCart);
        }

        let inventory = self.store.get_products(&product_ids(lines)).await?;

        let result = async {
            let cart = resolve_cart(lines, &inventory)?;
            let order = assemble_order(user_email, &cart, Utc::now())?;
            self.store.commit_order(order).await.map_err(Into::into)
        }
        .await;

        match &result {
            Ok(order_id) => {
                metrics::counter!("orders_placed_total").increment(1);
                metrics::histogram!("checkout_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(%order_id, user_email, "order placed");
            }
            Err(err) => {
                metrics::counter!("orders_rejected_total").increment(1);
                tracing::warn!(user_email, error = %err, "order rejected");
            }
        }

        result
    }

    /// Returns the user's orders, newest first, with nested items and
    /// current product titles. All product lookups across all orders
    /// are batched into a single retrieval. Read-only.
    #[tracing::instrument(skip(self))]
    pub async fn order_history(&self, user_email: &str) -> Result<Vec<OrderView>, CheckoutError> {
        let orders = self.store.list_orders(user_email).await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let items = self.store.list_items(&order_ids).await?;

        let product_ids: Vec<ProductId> = items
            .iter()
            .map(|it| it.product_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let products = self.store.get_products(&product_ids).await?;

        Ok(build_history(orders, items, &products))
    }
}

fn product_ids(lines: &[CartLine]) -> Vec<ProductId> {
    lines
        .iter()
        .map(|l| l.product_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect()
}
