use thiserror::Error;

use crate::types::ProductId;

/// Boxed error from a session store or catalog implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The session store failed to read or write the cart.
    #[error("session store error: {0}")]
    Session(#[source] BoxError),

    /// The catalog lookup failed.
    #[error("catalog error: {0}")]
    Catalog(#[source] BoxError),

    /// Adding would push a line's quantity past `u32::MAX`.
    #[error("quantity overflow for product {0}")]
    QuantityOverflow(ProductId),
}

impl CartError {
    pub(crate) fn session(err: impl Into<BoxError>) -> Self {
        Self::Session(err.into())
    }

    pub(crate) fn catalog(err: impl Into<BoxError>) -> Self {
        Self::Catalog(err.into())
    }
}
