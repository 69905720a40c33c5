//! Product repository backing the cart's catalog lookups.

use cartwheel_core::{Catalog, Price, Product, ProductId};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use super::RepositoryError;

/// Row shape of `storefront.product`.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: String,
    price: Decimal,
    available: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        if row.price.is_sign_negative() {
            return Err(RepositoryError::DataCorruption(format!(
                "negative price {} for product {}",
                row.price, row.id
            )));
        }

        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            price: Price::new(row.price),
            available: row.available,
        })
    }
}

/// Repository for product catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, slug, price, available
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get every product whose ID is in `ids`. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, slug, price, available
            FROM storefront.product
            WHERE id = ANY($1)
            ORDER BY name, id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }
}

impl Catalog for ProductRepository<'_> {
    type Error = RepositoryError;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, Self::Error> {
        self.get_by_id(id).await
    }

    async fn batch_get(&self, ids: &[ProductId]) -> Result<Vec<Product>, Self::Error> {
        self.get_many(ids).await
    }
}
