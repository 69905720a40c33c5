//! Integration tests for the cart persisted in a tower-sessions session.
//!
//! Each `browser.request()` / `browser.finish()` pair stands in for one HTTP
//! request: the session is loaded from the shared `MemoryStore`, the cart is
//! bound to it, and the session is saved back afterwards.

#![allow(clippy::unwrap_used)]

use cartwheel_core::{CART_SESSION_KEY, Cart, Price, ProductId};
use cartwheel_integration_tests::{Browser, MemoryCatalog, product};
use serde_json::{Value, json};

async fn stored_cart(browser: &Browser) -> Option<Value> {
    browser.request().get::<Value>(CART_SESSION_KEY).await.unwrap()
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_first_visit_stores_empty_cart() {
    let mut browser = Browser::default();

    let session = browser.request();
    let cart = Cart::bind(session.clone()).await.unwrap();
    assert_eq!(cart.count(), 0);
    browser.finish(session).await.unwrap();

    assert_eq!(stored_cart(&browser).await, Some(json!({})));
}

#[tokio::test]
async fn test_cart_survives_across_requests() {
    let mut browser = Browser::default();
    let p = product(7, 1990);

    let session = browser.request();
    let mut cart = Cart::bind(session.clone()).await.unwrap();
    cart.add(&p, 2, false).await.unwrap();
    browser.finish(session).await.unwrap();

    assert_eq!(
        stored_cart(&browser).await,
        Some(json!({ "7": { "quantity": 2, "price": "19.90" } }))
    );

    let session = browser.request();
    let cart = Cart::bind(session.clone()).await.unwrap();
    assert_eq!(cart.line(p.id).unwrap().quantity, 2);
    assert_eq!(cart.total_price(), Price::from_cents(3980));
}

#[tokio::test]
async fn test_separate_browsers_have_separate_carts() {
    let mut alice = Browser::default();
    let mut bob = Browser::default();

    let session = alice.request();
    let mut cart = Cart::bind(session.clone()).await.unwrap();
    cart.add(&product(1, 100), 3, false).await.unwrap();
    alice.finish(session).await.unwrap();

    let session = bob.request();
    let cart = Cart::bind(session.clone()).await.unwrap();
    assert_eq!(cart.count(), 0);
    bob.finish(session).await.unwrap();
}

// =============================================================================
// Quantity semantics
// =============================================================================

#[tokio::test]
async fn test_accumulation_across_requests() {
    let mut browser = Browser::default();
    let p = product(1, 500);

    for quantity in [2, 3] {
        let session = browser.request();
        let mut cart = Cart::bind(session.clone()).await.unwrap();
        cart.add(&p, quantity, false).await.unwrap();
        browser.finish(session).await.unwrap();
    }

    let cart = Cart::bind(browser.request()).await.unwrap();
    assert_eq!(cart.line(p.id).unwrap().quantity, 5);
}

#[tokio::test]
async fn test_replacement_across_requests() {
    let mut browser = Browser::default();
    let p = product(1, 500);

    for (quantity, update) in [(2, false), (5, true)] {
        let session = browser.request();
        let mut cart = Cart::bind(session.clone()).await.unwrap();
        cart.add(&p, quantity, update).await.unwrap();
        browser.finish(session).await.unwrap();
    }

    let cart = Cart::bind(browser.request()).await.unwrap();
    assert_eq!(cart.line(p.id).unwrap().quantity, 5);
}

#[tokio::test]
async fn test_count_sums_distinct_products() {
    let session = Browser::default().request();
    let mut cart = Cart::bind(session).await.unwrap();
    cart.add(&product(1, 100), 2, false).await.unwrap();
    cart.add(&product(2, 100), 3, false).await.unwrap();

    assert_eq!(cart.count(), 5);
}

// =============================================================================
// Remove & clear
// =============================================================================

#[tokio::test]
async fn test_remove_is_idempotent() {
    let mut browser = Browser::default();
    let p = product(1, 100);

    let session = browser.request();
    let mut cart = Cart::bind(session.clone()).await.unwrap();
    cart.remove(p.id).await.unwrap();
    cart.remove(p.id).await.unwrap();
    assert_eq!(cart.count(), 0);

    cart.add(&p, 1, false).await.unwrap();
    cart.remove(p.id).await.unwrap();
    cart.remove(p.id).await.unwrap();
    browser.finish(session).await.unwrap();

    assert_eq!(stored_cart(&browser).await, Some(json!({})));
}

#[tokio::test]
async fn test_clear_then_reuse() {
    let mut browser = Browser::default();
    let p = product(1, 250);

    let session = browser.request();
    let mut cart = Cart::bind(session.clone()).await.unwrap();
    cart.add(&p, 4, false).await.unwrap();
    cart.clear().await.unwrap();
    assert_eq!(cart.count(), 0);
    browser.finish(session).await.unwrap();

    assert_eq!(stored_cart(&browser).await, None);

    let session = browser.request();
    let mut cart = Cart::bind(session.clone()).await.unwrap();
    assert_eq!(cart.count(), 0);
    cart.add(&p, 1, false).await.unwrap();
    assert_eq!(cart.line(p.id).unwrap().quantity, 1);
    browser.finish(session).await.unwrap();

    assert_eq!(
        stored_cart(&browser).await,
        Some(json!({ "1": { "quantity": 1, "price": "2.50" } }))
    );
}

// =============================================================================
// Catalog join
// =============================================================================

#[tokio::test]
async fn test_enumeration_yields_every_line() {
    let catalog = MemoryCatalog::default();
    let session = Browser::default().request();
    let mut cart = Cart::bind(session).await.unwrap();

    for id in 1..=4 {
        let p = product(id, i64::from(id) * 100);
        catalog.insert(p.clone());
        cart.add(&p, 2, false).await.unwrap();
    }

    let mut items: Vec<_> = cart.items(&catalog).await.unwrap().collect();
    items.sort_by_key(|item| item.product.id);

    assert_eq!(items.len(), 4);
    for (item, id) in items.iter().zip(1_i64..) {
        assert_eq!(item.quantity, 2);
        assert_eq!(item.total_price, Price::from_cents(id * 200));
    }
}

#[tokio::test]
async fn test_deleted_product_is_skipped() {
    let catalog = MemoryCatalog::default();
    let session = Browser::default().request();
    let mut cart = Cart::bind(session).await.unwrap();

    let kept = [product(1, 100), product(3, 300)];
    let gone = product(2, 200);
    for p in kept.iter().chain([&gone]) {
        catalog.insert(p.clone());
        cart.add(p, 1, false).await.unwrap();
    }
    catalog.delete(gone.id);

    let mut ids: Vec<ProductId> = cart
        .items(&catalog)
        .await
        .unwrap()
        .map(|item| item.product.id)
        .collect();
    ids.sort();

    assert_eq!(ids, vec![ProductId::new(1), ProductId::new(3)]);
}

#[tokio::test]
async fn test_total_keeps_snapshot_price() {
    let catalog = MemoryCatalog::default();
    let session = Browser::default().request();
    let mut cart = Cart::bind(session).await.unwrap();

    let mut p = product(1, 1000);
    catalog.insert(p.clone());
    cart.add(&p, 2, false).await.unwrap();

    p.price = Price::from_cents(1500);
    catalog.insert(p.clone());

    assert_eq!(cart.total_price(), Price::from_cents(2000));
    let items: Vec<_> = cart.items(&catalog).await.unwrap().collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].unit_price, Price::from_cents(1000));
    assert_eq!(items[0].product.price, Price::from_cents(1500));
    assert_eq!(items[0].total_price, Price::from_cents(2000));
}
