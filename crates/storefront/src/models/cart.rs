//! Cart domain types and the line arithmetic that keeps totals consistent.
//!
//! Invariants maintained by every mutating method:
//! - each product appears in at most one line
//! - `line.subtotal == line.unit_price * line.quantity`
//! - `cart.total == sum(line.subtotal)`

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use alpaca_core::{CartId, Price, ProductId, UserId};

use super::Product;

/// One product entry in a cart (or in an order snapshot).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    #[serde(rename = "producto_id")]
    pub product_id: ProductId,
    /// Product name at the time the line was last touched.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Unit price at the time the line was last touched.
    #[serde(rename = "precio")]
    pub unit_price: Price,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// Most units of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// Largest cart total, in cents. Matches the `NUMERIC(14, 2)` total columns.
const MAX_TOTAL_CENTS: i64 = 99_999_999_999_999;

/// Largest total a cart or order may reach.
#[must_use]
pub fn max_cart_total() -> Decimal {
    Decimal::new(MAX_TOTAL_CENTS, 2)
}

/// An add that would push a cart past its limits. The cart is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartLimit {
    #[error("line quantity would exceed {MAX_LINE_QUANTITY}")]
    Quantity,
    #[error("cart total would exceed the storable maximum")]
    Total,
}

/// A user's shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    #[serde(rename = "usuario")]
    pub user_id: UserId,
    #[serde(rename = "productos")]
    pub lines: Vec<CartLine>,
    pub total: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// A cart with no lines and a zero total.
    #[must_use]
    pub const fn empty(id: CartId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            lines: Vec::new(),
            total: Decimal::ZERO,
            updated_at: now,
        }
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line for the same product is merged: its quantity grows,
    /// its price snapshot is refreshed to the product's current price and the
    /// subtotal is recomputed from both.
    ///
    /// # Errors
    ///
    /// Returns [`CartLimit`] if the line would hold more than
    /// [`MAX_LINE_QUANTITY`] units or the total would pass [`max_cart_total`].
    pub fn add_line(&mut self, product: &Product, quantity: u32) -> Result<(), CartLimit> {
        let existing = self.lines.iter().position(|l| l.product_id == product.id);
        let held = existing
            .and_then(|i| self.lines.get(i))
            .map_or(0, |l| l.quantity);

        let new_quantity = held
            .checked_add(quantity)
            .filter(|q| *q <= MAX_LINE_QUANTITY)
            .ok_or(CartLimit::Quantity)?;
        let subtotal = product
            .price
            .line_total(new_quantity)
            .ok_or(CartLimit::Total)?;
        let total = self
            .lines
            .iter()
            .filter(|l| l.product_id != product.id)
            .try_fold(subtotal, |acc, l| acc.checked_add(l.subtotal))
            .filter(|t| *t <= max_cart_total())
            .ok_or(CartLimit::Total)?;

        match existing.and_then(|i| self.lines.get_mut(i)) {
            Some(line) => {
                line.quantity = new_quantity;
                line.name.clone_from(&product.name);
                line.unit_price = product.price;
                line.subtotal = subtotal;
            }
            None => self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity: new_quantity,
                subtotal,
            }),
        }
        self.total = total;
        Ok(())
    }

    /// Drop the line for `product_id`. Returns whether a line was removed.
    pub fn remove_line(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.recompute_total();
        self.lines.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.total = Decimal::ZERO;
    }

    /// Set `total` to the sum of line subtotals.
    pub fn recompute_total(&mut self) {
        self.total = self
            .lines
            .iter()
            .fold(Decimal::ZERO, |acc, l| acc.saturating_add(l.subtotal));
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, l| acc.saturating_add(l.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
