//! Product catalog lookup.

use std::future::Future;

use crate::types::{Product, ProductId};

/// Read-only access to the product catalog.
///
/// Missing products are not errors: `get` returns `None` and `batch_get`
/// simply leaves them out of the result.
pub trait Catalog: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up a single product.
    fn get(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send;

    /// Look up every product in `ids` that currently exists, in one query.
    fn batch_get(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send;
}
