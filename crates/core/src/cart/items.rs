//! Cart lines joined with live catalog data.

use std::vec;

use crate::types::{Price, Product};

use super::{CartStore, LineItem};

/// A stored line joined with its catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedLineItem {
    pub product: Product,
    pub quantity: u32,
    /// Snapshotted price, not `product.price`.
    pub unit_price: Price,
    pub total_price: Price,
}

impl EnrichedLineItem {
    fn new(product: Product, line: LineItem) -> Self {
        Self {
            product,
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price: line.total_price(),
        }
    }
}

/// Iterator over the lines of a cart whose products still exist.
///
/// Produced by [`Cart::items`](super::Cart::items). Products the catalog
/// returned that have no stored line are skipped.
#[derive(Debug)]
pub struct CartItems<'a> {
    store: &'a CartStore,
    products: vec::IntoIter<Product>,
}

impl<'a> CartItems<'a> {
    pub(super) fn new(store: &'a CartStore, products: Vec<Product>) -> Self {
        Self {
            store,
            products: products.into_iter(),
        }
    }
}

impl Iterator for CartItems<'_> {
    type Item = EnrichedLineItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.products.find_map(|product| {
            self.store
                .get(product.id)
                .copied()
                .map(|line| EnrichedLineItem::new(product, line))
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.products.size_hint().1)
    }
}
