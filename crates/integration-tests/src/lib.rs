//! Integration tests for Cartwheel.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database needed)
//! cargo test -p cartwheel-integration-tests
//!
//! # HTTP round trip against a running storefront with a seeded catalog
//! STOREFRONT_BASE_URL=http://localhost:3000 CART_TEST_PRODUCT_ID=1 \
//!     cargo test -p cartwheel-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_session` - `Cart` driven through a real `tower_sessions::Session`
//! - `storefront_http` - Cart endpoints over HTTP (ignored by default)
//!
//! This library holds the shared fixtures.

use std::sync::Arc;

use cartwheel_core::{Price, Product, ProductId};
use tower_sessions::{MemoryStore, Session};

pub use cartwheel_core::cart::testing::MemoryCatalog;

/// Build a catalog product priced in cents.
#[must_use]
pub fn product(id: i32, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        slug: format!("product-{id}"),
        price: Price::from_cents(cents),
        available: true,
    }
}

/// A session store shared by simulated requests from the same browser.
#[derive(Debug, Default, Clone)]
pub struct Browser {
    store: Arc<MemoryStore>,
    session: Option<Session>,
}

impl Browser {
    /// Start a new request, reusing the session cookie from the last one.
    #[must_use]
    pub fn request(&self) -> Session {
        let id = self.session.as_ref().and_then(Session::id);
        Session::new(id, Arc::clone(&self.store), None)
    }

    /// Finish a request: persist the session like the session middleware does
    /// and remember its ID for the next request.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the save.
    pub async fn finish(&mut self, session: Session) -> Result<(), tower_sessions::session::Error> {
        session.save().await?;
        self.session = Some(session);
        Ok(())
    }
}
