//! Cartwheel Core - session cart logic and shared types.
//!
//! This crate provides the pieces shared by all Cartwheel components:
//! - `storefront` - Public-facing site serving the cart pages
//! - `cli` - Command-line tools for migrations
//!
//! # Architecture
//!
//! The core crate performs no I/O of its own. The cart talks to the outside
//! world only through two capability traits, [`SessionStore`] and
//! [`Catalog`], which callers implement (or enable via features) and pass in.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs and prices, plus the catalog `Product`
//! - [`cart`] - The session-scoped cart and its storage format
//!
//! # Features
//!
//! - `postgres` - sqlx `Type`/`Encode`/`Decode` for ID newtypes
//! - `sessions` - [`SessionStore`] implementation for `tower_sessions::Session`
//! - `testing` - in-memory fakes in [`cart::testing`] for downstream tests

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{
    CART_SESSION_KEY, Cart, CartError, CartItems, CartStore, Catalog, EnrichedLineItem, LineItem,
    SessionStore,
};
pub use types::*;
