//! Session key-value storage used to persist the cart.

use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};

/// Per-session key-value store.
///
/// Values are serialized as JSON-like data. Writing with [`set`](Self::set)
/// is the commit: callers must call it after every change they want kept.
pub trait SessionStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read and decode the value under `key`.
    fn get<T>(&self, key: &str) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send
    where
        T: DeserializeOwned + Send;

    /// Encode and write `value` under `key`.
    fn set<T>(&self, key: &str, value: &T) -> impl Future<Output = Result<(), Self::Error>> + Send
    where
        T: Serialize + Sync;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[cfg(feature = "sessions")]
impl SessionStore for tower_sessions::Session {
    type Error = tower_sessions::session::Error;

    async fn get<T>(&self, key: &str) -> Result<Option<T>, Self::Error>
    where
        T: DeserializeOwned + Send,
    {
        Self::get(self, key).await
    }

    async fn set<T>(&self, key: &str, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + Sync,
    {
        self.insert(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.remove_value(key).await?;
        Ok(())
    }
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    type Error = S::Error;

    async fn get<T>(&self, key: &str) -> Result<Option<T>, Self::Error>
    where
        T: DeserializeOwned + Send,
    {
        (**self).get(key).await
    }

    async fn set<T>(&self, key: &str, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + Sync,
    {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        (**self).delete(key).await
    }
}
