//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (database)
//!
//! # Cart
//! GET  /cart                     - Cart page
//! POST /cart/add/{product_id}    - Add or update quantity, redirects to /cart
//! POST /cart/remove/{product_id} - Remove line, redirects to /cart
//! POST /cart/clear               - Empty cart, redirects to /cart
//! GET  /cart/count               - Cart count badge (fragment)
//! ```

pub mod cart;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{product_id}", post(cart::add))
        .route("/remove/{product_id}", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/cart", cart_routes())
}
