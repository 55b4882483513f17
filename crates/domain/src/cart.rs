//! Cart validation against an inventory snapshot.
//!
//! Two entry points with deliberately different failure modes:
//! [`validate_cart`] checks every line and collects all problems
//! (checkout preview must show the user everything wrong with their
//! cart), while [`resolve_cart`] fails on the first offending line
//! (order placement just needs to abort safely).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use common::ProductId;
use store::Product;

use crate::error::CheckoutError;

/// One requested cart line as submitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }

    /// Rejects non-positive quantities.
    pub fn check_quantity(&self) -> Result<(), CheckoutError> {
        if self.quantity < 1 {
            return Err(CheckoutError::InvalidQuantity {
                product_id: self.product_id,
            });
        }
        Ok(())
    }
}

/// Why a cart line was rejected during preview validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueReason {
    NotFound,
    OutOfStock,
}

/// A structured problem with one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartIssue {
    pub product_id: ProductId,
    pub reason: IssueReason,
    /// Available stock; present only for `OUT_OF_STOCK`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    /// Requested quantity; present only for `OUT_OF_STOCK`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<i64>,
}

impl CartIssue {
    pub fn not_found(product_id: ProductId) -> Self {
        Self {
            product_id,
            reason: IssueReason::NotFound,
            stock: None,
            requested: None,
        }
    }

    pub fn out_of_stock(product_id: ProductId, stock: i64, requested: i64) -> Self {
        Self {
            product_id,
            reason: IssueReason::OutOfStock,
            stock: Some(stock),
            requested: Some(requested),
        }
    }
}

/// Checks every requested line against the inventory snapshot and
/// collects all problems. Never short-circuits. Read-only.
pub fn validate_cart(
    lines: &[CartLine],
    inventory: &HashMap<ProductId, Product>,
) -> Vec<CartIssue> {
    let mut issues = Vec::new();

    for line in lines {
        match inventory.get(&line.product_id) {
            None => issues.push(CartIssue::not_found(line.product_id)),
            Some(product) if line.quantity > product.stock => {
                issues.push(CartIssue::out_of_stock(
                    line.product_id,
                    product.stock,
                    line.quantity,
                ));
            }
            Some(_) => {}
        }
    }

    issues
}

/// One validated cart line with its product resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    pub product: Product,
    pub quantity: i64,
}

impl ResolvedLine {
    /// Unit price snapshot carried into the order.
    pub fn unit_price_cents(&self) -> i64 {
        self.product.price_cents
    }
}

/// A cart whose every line passed fail-fast validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedCart {
    pub lines: Vec<ResolvedLine>,
}

/// Resolves the requested lines against the inventory snapshot,
/// failing on the first offending line. Used by the order-creation
/// path; the commit engine re-checks stock under its own lock, this
/// pass only rejects obviously doomed orders early.
pub fn resolve_cart(
    lines: &[CartLine],
    inventory: &HashMap<ProductId, Product>,
) -> Result<ResolvedCart, CheckoutError> {
    let mut resolved = Vec::with_capacity(lines.len());

    for line in lines {
        let product = inventory
            .get(&line.product_id)
            .ok_or(CheckoutError::ProductNotFound(line.product_id))?;
        line.check_quantity()?;
        if product.stock < line.quantity {
            return Err(CheckoutError::InsufficientStock {
                product_id: line.product_id,
                available: product.stock,
                requested: line.quantity,
            });
        }
        resolved.push(ResolvedLine {
            product: product.clone(),
            quantity: line.quantity,
        });
    }

    Ok(ResolvedCart { lines: resolved })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Currency;

    fn product(id: i64, price_cents: i64, stock: i64, currency: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: None,
            price_cents,
            currency: Currency::new(currency),
            stock,
            slug: format!("product-{id}"),
        }
    }

    fn inventory(products: Vec<Product>) -> HashMap<ProductId, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn valid_cart_produces_no_issues() {
        let inv = inventory(vec![product(1, 500, 3, "USD")]);
        let issues = validate_cart(&[CartLine::new(1, 2)], &inv);
        assert!(issues.is_empty());
    }

    #[test]
    fn preview_collects_all_issues() {
        // Unknown product and an oversized quantity must both be
        // reported, not just the first.
        let inv = inventory(vec![product(1, 500, 3, "USD")]);
        let lines = [CartLine::new(99, 1), CartLine::new(1, 10)];

        let issues = validate_cart(&lines, &inv);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0], CartIssue::not_found(ProductId::new(99)));
        assert_eq!(issues[1], CartIssue::out_of_stock(ProductId::new(1), 3, 10));
    }

    #[test]
    fn issue_serialization_shape() {
        let issue = CartIssue::not_found(ProductId::new(99));
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"product_id": 99, "reason": "NOT_FOUND"})
        );

        let issue = CartIssue::out_of_stock(ProductId::new(1), 3, 10);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "product_id": 1,
                "reason": "OUT_OF_STOCK",
                "stock": 3,
                "requested": 10
            })
        );
    }

    #[test]
    fn resolve_fails_fast_on_missing_product() {
        let inv = inventory(vec![product(1, 500, 3, "USD")]);
        let lines = [CartLine::new(99, 1), CartLine::new(1, 10)];

        let err = resolve_cart(&lines, &inv).unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound(id) if id == ProductId::new(99)));
    }

    #[test]
    fn resolve_rejects_non_positive_quantity() {
        let inv = inventory(vec![product(1, 500, 3, "USD")]);

        for quantity in [0, -2] {
            let err = resolve_cart(&[CartLine::new(1, quantity)], &inv).unwrap_err();
            assert!(matches!(err, CheckoutError::InvalidQuantity { .. }));
        }
    }

    #[test]
    fn resolve_reports_available_and_requested() {
        let inv = inventory(vec![product(1, 500, 3, "USD")]);

        let err = resolve_cart(&[CartLine::new(1, 5)], &inv).unwrap_err();
        match err {
            CheckoutError::InsufficientStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, ProductId::new(1));
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn resolve_snapshots_unit_price() {
        let inv = inventory(vec![product(1, 500, 3, "USD")]);
        let cart = resolve_cart(&[CartLine::new(1, 2)], &inv).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].unit_price_cents(), 500);
        assert_eq!(cart.lines[0].quantity, 2);
    }
}
