//! In-memory session store and catalog for cart tests.
//!
//! Compiled for this crate's own tests and, behind the `testing` feature, for
//! downstream test crates.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::types::{Product, ProductId};

use super::{Catalog, SessionStore};

/// Error returned by the in-memory fakes.
#[derive(Debug, Error)]
pub enum FakeError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store unavailable")]
    Unavailable,
}

/// Session store holding JSON values in memory.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: Mutex<HashMap<String, Value>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemorySession {
    /// The stored JSON under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    /// Store raw JSON under `key` without counting a write.
    pub fn put_raw(&self, key: &str, value: Value) {
        self.values.lock().unwrap().insert(key.to_owned(), value);
    }

    /// Number of successful writes and deletes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every later `set` fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

impl SessionStore for MemorySession {
    type Error = FakeError;

    async fn get<T>(&self, key: &str) -> Result<Option<T>, Self::Error>
    where
        T: DeserializeOwned + Send,
    {
        self.raw(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(FakeError::from)
    }

    async fn set<T>(&self, key: &str, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + Sync,
    {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FakeError::Unavailable);
        }
        let value = serde_json::to_value(value)?;
        self.put_raw(key, value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.values.lock().unwrap().remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Product catalog held in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
    batch_calls: AtomicUsize,
    fail_lookups: AtomicBool,
}

impl MemoryCatalog {
    /// Insert or replace a product.
    pub fn insert(&self, product: Product) {
        self.products.lock().unwrap().insert(product.id, product);
    }

    /// Delete a product.
    pub fn delete(&self, id: ProductId) {
        self.products.lock().unwrap().remove(&id);
    }

    /// Number of `batch_get` calls so far.
    #[must_use]
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Make every later lookup fail.
    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }
}

impl Catalog for MemoryCatalog {
    type Error = FakeError;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, Self::Error> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(FakeError::Unavailable);
        }
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn batch_get(&self, ids: &[ProductId]) -> Result<Vec<Product>, Self::Error> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(FakeError::Unavailable);
        }
        let products = self.products.lock().unwrap();
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }
}
