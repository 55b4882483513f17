//! Order assembly: totals and currency uniformity.

use chrono::{DateTime, Utc};

use common::Money;
use store::{NewOrder, NewOrderItem, OrderStatus};

use crate::cart::ResolvedCart;
use crate::error::CheckoutError;

/// Builds the not-yet-persisted order aggregate from a resolved cart.
///
/// The total is the exact integer sum of `unit_price_cents * quantity`
/// over all lines; money never touches floating point. The first
/// line's currency establishes the order currency and every other
/// line must match, otherwise the entire order is rejected — there
/// are no partial orders.
pub fn assemble_order(
    user_email: &str,
    cart: &ResolvedCart,
    now: DateTime<Utc>,
) -> Result<NewOrder, CheckoutError> {
    let first = cart.lines.first().ok_or(CheckoutError::EmptyCart)?;
    let currency = first.product.currency.clone();

    let mut total = Money::zero();
    let mut items = Vec::with_capacity(cart.lines.len());

    for line in &cart.lines {
        if line.product.currency != currency {
            return Err(CheckoutError::MixedCurrency {
                expected: currency,
                found: line.product.currency.clone(),
                product_id: line.product.id,
            });
        }

        let line_total = Money::from_cents(line.unit_price_cents())
            .checked_mul(line.quantity)
            .ok_or(CheckoutError::TotalOverflow)?;
        total = total
            .checked_add(line_total)
            .ok_or(CheckoutError::TotalOverflow)?;

        items.push(NewOrderItem {
            product_id: line.product.id,
            unit_price_cents: line.unit_price_cents(),
            quantity: line.quantity,
        });
    }

    Ok(NewOrder {
        user_email: user_email.to_string(),
        status: OrderStatus::Paid,
        total_cents: total.cents(),
        currency,
        created_at: now,
        items,
    })
}
