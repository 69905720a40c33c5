//! The session-persisted cart contents.
//!
//! # Storage format
//!
//! ```json
//! { "7": { "quantity": 2, "price": "19.90" } }
//! ```
//!
//! Keys are product IDs as decimal strings, `price` is the unit price
//! snapshotted when the product was first added.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Price, Product, ProductId};

use super::CartError;

/// Quantity and snapshotted unit price for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub quantity: u32,
    /// Price at the time the product was first added.
    #[serde(rename = "price")]
    pub unit_price: Price,
}

impl LineItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Mapping of product ID to line item, as stored in the session.
///
/// Every present line has a quantity above zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartStore {
    lines: HashMap<ProductId, LineItem>,
}

impl CartStore {
    /// Create an empty cart store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of `product`, or set it to `quantity` when
    /// `update_quantity` is true.
    ///
    /// A new line snapshots `product.price`. Setting a quantity of zero
    /// removes the line; adding zero never creates one.
    ///
    /// Returns whether the store changed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityOverflow` if accumulating would exceed
    /// `u32::MAX`. The store is left unchanged.
    pub fn add(
        &mut self,
        product: &Product,
        quantity: u32,
        update_quantity: bool,
    ) -> Result<bool, CartError> {
        if quantity == 0 {
            return Ok(update_quantity && self.remove(product.id));
        }

        let current = self.lines.get(&product.id).map_or(0, |line| line.quantity);
        let next = if update_quantity {
            quantity
        } else {
            current
                .checked_add(quantity)
                .ok_or(CartError::QuantityOverflow(product.id))?
        };

        self.lines
            .entry(product.id)
            .or_insert(LineItem {
                quantity: 0,
                unit_price: product.price,
            })
            .quantity = next;

        Ok(next != current)
    }

    /// Drop lines with a zero quantity. Returns how many were dropped.
    pub fn drop_empty_lines(&mut self) -> usize {
        let before = self.lines.len();
        self.lines.retain(|_, line| line.quantity > 0);
        before - self.lines.len()
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        self.lines.remove(&product_id).is_some()
    }

    /// Get the stored line for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&LineItem> {
        self.lines.get(&product_id)
    }

    /// Iterate over stored lines.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, &LineItem)> {
        self.lines.iter().map(|(id, line)| (*id, line))
    }

    /// Product IDs of every stored line, sorted.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<_> = self.lines.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` using the snapshotted prices.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.values().map(LineItem::total_price).sum()
    }
}
