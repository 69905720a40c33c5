//! Catalog product as seen by the cart.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product from the catalog.
///
/// Read-only from the cart's point of view: the cart snapshots `price` when
/// a product is first added and never writes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Price,
    pub available: bool,
}
