//! Session-scoped shopping cart.
//!
//! A [`Cart`] is bound to one session for the duration of a request. It
//! decodes the [`CartStore`] from the session on bind, applies each change
//! to a copy, writes it back with [`SessionStore::set`], and keeps the copy
//! only once the write succeeds.
//! Prices are snapshotted on first add, so totals reflect what the shopper
//! was quoted even if the catalog price changes later.
//!
//! # Example
//!
//! ```rust,ignore
//! use cartwheel_core::Cart;
//!
//! let mut cart = Cart::bind(session).await?;
//! cart.add(&product, 2, false).await?;
//!
//! for item in cart.items(&catalog).await? {
//!     println!("{} x{} = {}", item.product.name, item.quantity, item.total_price);
//! }
//! ```

mod catalog;
mod error;
mod items;
mod session;
mod store;

pub use catalog::Catalog;
pub use error::{BoxError, CartError};
pub use items::{CartItems, EnrichedLineItem};
pub use session::SessionStore;
pub use store::{CartStore, LineItem};

use tracing::debug;

use crate::types::{Price, Product, ProductId};

/// Default session key the cart is stored under.
pub const CART_SESSION_KEY: &str = "cart";

/// A cart bound to one session.
#[derive(Debug)]
pub struct Cart<S> {
    session: S,
    key: String,
    store: CartStore,
}

impl<S: SessionStore> Cart<S> {
    /// Bind to `session` using [`CART_SESSION_KEY`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be read or written.
    pub async fn bind(session: S) -> Result<Self, CartError> {
        Self::bind_with_key(session, CART_SESSION_KEY).await
    }

    /// Bind to `session`, storing the cart under `key`.
    ///
    /// If the session has no cart yet, an empty one is written immediately
    /// so the key is present from then on. Stored lines with a zero quantity
    /// are dropped and the cleaned cart written back.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be read or written.
    pub async fn bind_with_key(session: S, key: impl Into<String>) -> Result<Self, CartError> {
        let key = key.into();
        let stored = session
            .get::<CartStore>(&key)
            .await
            .map_err(CartError::session)?;

        let store = if let Some(mut store) = stored {
            let dropped = store.drop_empty_lines();
            if dropped > 0 {
                session
                    .set(&key, &store)
                    .await
                    .map_err(CartError::session)?;
                debug!(key = %key, dropped, "dropped zero-quantity cart lines");
            }
            store
        } else {
            let store = CartStore::new();
            session
                .set(&key, &store)
                .await
                .map_err(CartError::session)?;
            debug!(key = %key, "initialized empty cart in session");
            store
        };

        Ok(Self {
            session,
            key,
            store,
        })
    }

    /// Add `quantity` of `product` to the cart.
    ///
    /// With `update_quantity` the line's quantity is replaced instead of
    /// increased; replacing with zero removes the line. A new line takes
    /// `product.price` as its unit price.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityOverflow` if the accumulated quantity does
    /// not fit in a `u32`, or `CartError::Session` if the commit fails.
    pub async fn add(
        &mut self,
        product: &Product,
        quantity: u32,
        update_quantity: bool,
    ) -> Result<(), CartError> {
        let mut next = self.store.clone();
        if next.add(product, quantity, update_quantity)? {
            self.commit(next).await?;
            debug!(product_id = %product.id, quantity, update_quantity, "cart line changed");
        }
        Ok(())
    }

    /// Remove a product's line. Removing a product that is not in the cart
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the commit fails.
    pub async fn remove(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let mut next = self.store.clone();
        if next.remove(product_id) {
            self.commit(next).await?;
            debug!(product_id = %product_id, "cart line removed");
        }
        Ok(())
    }

    /// Remove the cart from the session entirely.
    ///
    /// The next bind on this session starts from an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session key cannot be removed.
    pub async fn clear(&mut self) -> Result<(), CartError> {
        self.session
            .delete(&self.key)
            .await
            .map_err(CartError::session)?;
        self.store = CartStore::new();
        debug!(key = %self.key, "cart cleared");
        Ok(())
    }

    /// Lines joined with their catalog products.
    ///
    /// Runs one batched catalog lookup per call. Lines whose product no
    /// longer exists are left out.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Catalog` if the lookup fails.
    pub async fn items<C: Catalog>(&self, catalog: &C) -> Result<CartItems<'_>, CartError> {
        if self.store.is_empty() {
            return Ok(CartItems::new(&self.store, Vec::new()));
        }

        let ids = self.store.product_ids();
        let products = catalog
            .batch_get(&ids)
            .await
            .map_err(CartError::catalog)?;

        if products.len() < ids.len() {
            debug!(
                stored = ids.len(),
                found = products.len(),
                "skipping cart lines for products missing from catalog"
            );
        }

        Ok(CartItems::new(&self.store, products))
    }

    /// Total quantity across all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.store.count()
    }

    /// Sum of `unit_price * quantity` over all stored lines, using the
    /// snapshotted prices.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.store.total_price()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The stored line for a product, if any.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&LineItem> {
        self.store.get(product_id)
    }

    /// The decoded cart contents.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// Write `next` to the session, then adopt it. On failure the cart keeps
    /// its previous contents.
    async fn commit(&mut self, next: CartStore) -> Result<(), CartError> {
        self.session
            .set(&self.key, &next)
            .await
            .map_err(CartError::session)?;
        self.store = next;
        Ok(())
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::testing::{MemoryCatalog, MemorySession};
    use super::*;

    fn product(id: i32, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            price: Price::new(Decimal::from_str(price).unwrap()),
            available: true,
        }
    }

    #[tokio::test]
    async fn test_bind_persists_empty_cart() {
        let session = MemorySession::default();
        let cart = Cart::bind(&session).await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(session.raw(CART_SESSION_KEY), Some(serde_json::json!({})));
        assert_eq!(session.writes(), 1);
    }

    #[tokio::test]
    async fn test_bind_loads_existing_cart() {
        let session = MemorySession::default();
        session.put_raw(
            CART_SESSION_KEY,
            serde_json::json!({ "3": { "quantity": 4, "price": "2.50" } }),
        );

        let cart = Cart::bind(&session).await.unwrap();
        assert_eq!(cart.count(), 4);
        assert_eq!(cart.total_price(), Price::from_cents(1000));
        assert_eq!(session.writes(), 0);
    }

    #[tokio::test]
    async fn test_bind_with_custom_key() {
        let session = MemorySession::default();
        let mut cart = Cart::bind_with_key(&session, "basket").await.unwrap();
        cart.add(&product(1, "1.00"), 1, false).await.unwrap();

        assert!(session.raw("basket").is_some());
        assert!(session.raw(CART_SESSION_KEY).is_none());
    }

    #[tokio::test]
    async fn test_add_accumulates() {
        let session = MemorySession::default();
        let p = product(1, "5.00");
        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&p, 2, false).await.unwrap();
        cart.add(&p, 3, false).await.unwrap();

        assert_eq!(cart.line(p.id).unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_add_replaces() {
        let session = MemorySession::default();
        let p = product(1, "5.00");
        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&p, 2, false).await.unwrap();
        cart.add(&p, 5, true).await.unwrap();

        assert_eq!(cart.line(p.id).unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_mutations_commit_to_session() {
        let session = MemorySession::default();
        let p = product(7, "19.90");
        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&p, 2, false).await.unwrap();

        assert_eq!(
            session.raw(CART_SESSION_KEY),
            Some(serde_json::json!({ "7": { "quantity": 2, "price": "19.90" } }))
        );

        // A second request sees the committed state
        let reloaded = Cart::bind(&session).await.unwrap();
        assert_eq!(reloaded.line(p.id).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_noops_do_not_commit() {
        let session = MemorySession::default();
        let p = product(1, "1.00");
        let mut cart = Cart::bind(&session).await.unwrap();
        let after_bind = session.writes();

        cart.remove(p.id).await.unwrap();
        cart.add(&p, 0, false).await.unwrap();
        assert_eq!(session.writes(), after_bind);

        cart.add(&p, 1, false).await.unwrap();
        assert_eq!(session.writes(), after_bind + 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let session = MemorySession::default();
        let p = product(1, "1.00");
        let mut cart = Cart::bind(&session).await.unwrap();

        cart.remove(p.id).await.unwrap();
        assert!(cart.is_empty());

        cart.add(&p, 1, false).await.unwrap();
        cart.remove(p.id).await.unwrap();
        cart.remove(p.id).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(session.raw(CART_SESSION_KEY), Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_clear_then_reuse() {
        let session = MemorySession::default();
        let p = product(1, "4.00");
        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&p, 3, false).await.unwrap();

        cart.clear().await.unwrap();
        assert_eq!(cart.count(), 0);
        assert!(session.raw(CART_SESSION_KEY).is_none());

        cart.add(&p, 2, false).await.unwrap();
        assert_eq!(cart.line(p.id).unwrap().quantity, 2);

        let mut fresh = Cart::bind(&session).await.unwrap();
        fresh.clear().await.unwrap();
        let rebound = Cart::bind(&session).await.unwrap();
        assert!(rebound.is_empty());
        assert_eq!(session.raw(CART_SESSION_KEY), Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_total_uses_snapshot_price() {
        let session = MemorySession::default();
        let catalog = MemoryCatalog::default();
        let mut a = product(1, "10.00");
        let b = product(2, "0.99");
        catalog.insert(a.clone());
        catalog.insert(b.clone());

        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&a, 2, false).await.unwrap();
        cart.add(&b, 3, false).await.unwrap();

        // Catalog price changes after the product was added
        a.price = Price::from_cents(9999);
        catalog.insert(a.clone());
        cart.add(&a, 1, false).await.unwrap();

        assert_eq!(cart.total_price(), Price::from_cents(3297));

        let items: Vec<_> = cart.items(&catalog).await.unwrap().collect();
        let line_a = items.iter().find(|i| i.product.id == a.id).unwrap();
        assert_eq!(line_a.unit_price, Price::from_cents(1000));
        assert_eq!(line_a.product.price, Price::from_cents(9999));
        assert_eq!(line_a.total_price, Price::from_cents(3000));
    }

    #[tokio::test]
    async fn test_items_yields_every_line() {
        let session = MemorySession::default();
        let catalog = MemoryCatalog::default();
        let mut cart = Cart::bind(&session).await.unwrap();

        for (id, price, qty) in [(1, "1.50", 2), (2, "2.00", 1), (3, "0.25", 4)] {
            let p = product(id, price);
            catalog.insert(p.clone());
            cart.add(&p, qty, false).await.unwrap();
        }

        let mut items: Vec<_> = cart.items(&catalog).await.unwrap().collect();
        items.sort_by_key(|i| i.product.id);

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].total_price, Price::from_cents(300));
        assert_eq!(items[1].total_price, Price::from_cents(200));
        assert_eq!(items[2].total_price, Price::from_cents(100));
        assert_eq!(catalog.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_items_skips_deleted_products() {
        let session = MemorySession::default();
        let catalog = MemoryCatalog::default();
        let keep = product(1, "1.00");
        let gone = product(2, "2.00");
        catalog.insert(keep.clone());
        catalog.insert(gone.clone());

        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&keep, 1, false).await.unwrap();
        cart.add(&gone, 1, false).await.unwrap();
        catalog.delete(gone.id);

        let items: Vec<_> = cart.items(&catalog).await.unwrap().collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product.id, keep.id);

        // Enumeration does not touch stored state
        assert!(cart.line(gone.id).is_some());
    }

    #[tokio::test]
    async fn test_items_can_be_repeated() {
        let session = MemorySession::default();
        let catalog = MemoryCatalog::default();
        let p = product(1, "1.00");
        catalog.insert(p.clone());

        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&p, 1, false).await.unwrap();

        assert_eq!(cart.items(&catalog).await.unwrap().count(), 1);
        assert_eq!(cart.items(&catalog).await.unwrap().count(), 1);
        assert_eq!(catalog.batch_calls(), 2);
    }

    #[tokio::test]
    async fn test_items_on_empty_cart_skips_catalog() {
        let session = MemorySession::default();
        let catalog = MemoryCatalog::default();
        let cart = Cart::bind(&session).await.unwrap();

        assert_eq!(cart.items(&catalog).await.unwrap().count(), 0);
        assert_eq!(catalog.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_count_sums_quantities() {
        let session = MemorySession::default();
        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&product(1, "1.00"), 2, false).await.unwrap();
        cart.add(&product(2, "1.00"), 3, false).await.unwrap();

        assert_eq!(cart.count(), 5);
    }

    #[tokio::test]
    async fn test_session_failure_propagates() {
        let session = MemorySession::default();
        let mut cart = Cart::bind(&session).await.unwrap();
        session.fail_writes();

        let err = cart.add(&product(1, "1.00"), 1, false).await.unwrap_err();
        assert!(matches!(err, CartError::Session(_)));
    }

    #[tokio::test]
    async fn test_failed_add_keeps_previous_contents() {
        let session = MemorySession::default();
        let p = product(1, "1.00");
        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&p, 2, false).await.unwrap();
        session.fail_writes();

        assert!(cart.add(&p, 3, false).await.is_err());
        assert!(cart.add(&product(2, "1.00"), 1, false).await.is_err());

        assert_eq!(cart.count(), 2);
        assert!(cart.line(ProductId::new(2)).is_none());
        assert_eq!(
            session.raw(CART_SESSION_KEY),
            Some(serde_json::json!({ "1": { "quantity": 2, "price": "1.00" } }))
        );
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_line() {
        let session = MemorySession::default();
        let p = product(1, "1.00");
        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&p, 2, false).await.unwrap();
        session.fail_writes();

        assert!(cart.remove(p.id).await.is_err());
        assert_eq!(cart.line(p.id).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_bind_drops_zero_quantity_lines() {
        let session = MemorySession::default();
        session.put_raw(
            CART_SESSION_KEY,
            serde_json::json!({
                "1": { "quantity": 0, "price": "1.00" },
                "2": { "quantity": 3, "price": "2.00" },
            }),
        );

        let cart = Cart::bind(&session).await.unwrap();

        assert!(cart.line(ProductId::new(1)).is_none());
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total_price(), Price::from_cents(600));
        assert_eq!(
            session.raw(CART_SESSION_KEY),
            Some(serde_json::json!({ "2": { "quantity": 3, "price": "2.00" } }))
        );
        assert_eq!(session.writes(), 1);
    }

    #[tokio::test]
    async fn test_bind_with_only_zero_lines_is_empty() {
        let session = MemorySession::default();
        session.put_raw(
            CART_SESSION_KEY,
            serde_json::json!({ "1": { "quantity": 0, "price": "1.00" } }),
        );

        let cart = Cart::bind(&session).await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
        assert_eq!(session.raw(CART_SESSION_KEY), Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_catalog_failure_propagates() {
        let session = MemorySession::default();
        let catalog = MemoryCatalog::default();
        let mut cart = Cart::bind(&session).await.unwrap();
        cart.add(&product(1, "1.00"), 1, false).await.unwrap();
        catalog.fail_lookups();

        let err = cart.items(&catalog).await.unwrap_err();
        assert!(matches!(err, CartError::Catalog(_)));
    }
}
