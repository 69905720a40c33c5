//! Seed the product catalog from a YAML file.
//!
//! # File format
//!
//! ```yaml
//! products:
//!   - name: Lavender Soap
//!     slug: lavender-soap
//!     price: "12.90"
//!   - name: Coconut Scrub
//!     slug: coconut-scrub
//!     price: "18.00"
//!     available: false
//! ```
//!
//! Products are upserted by slug, so re-running the seed updates prices.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use cartwheel_storefront::db;

use super::{CommandError, database_url};

#[derive(Debug, Deserialize)]
struct SeedFile {
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    slug: String,
    price: Decimal,
    #[serde(default = "default_available")]
    available: bool,
}

const fn default_available() -> bool {
    true
}

/// Parse and validate a seed file's contents.
fn parse(contents: &str) -> Result<Vec<SeedProduct>, CommandError> {
    let file: SeedFile = serde_yaml::from_str(contents)?;

    for product in &file.products {
        if product.slug.trim().is_empty() {
            return Err(CommandError::InvalidSeed(format!(
                "product {:?} has an empty slug",
                product.name
            )));
        }
        if product.price.is_sign_negative() {
            return Err(CommandError::InvalidSeed(format!(
                "product {:?} has a negative price",
                product.slug
            )));
        }
    }

    Ok(file.products)
}

/// Upsert products from a YAML file into `storefront.product`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the data is
/// invalid, or a database operation fails.
pub async fn products(file_path: &str) -> Result<(), CommandError> {
    let contents = std::fs::read_to_string(Path::new(file_path)).map_err(|source| {
        CommandError::Io {
            path: file_path.to_string(),
            source,
        }
    })?;
    let products = parse(&contents)?;

    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;

    let mut tx = pool.begin().await?;
    for product in &products {
        sqlx::query(
            r"
            INSERT INTO storefront.product (name, slug, price, available)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name,
                price = EXCLUDED.price,
                available = EXCLUDED.available,
                updated_at = NOW()
            ",
        )
        .bind(&product.name)
        .bind(&product.slug)
        .bind(product.price)
        .bind(product.available)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(count = products.len(), "Seeded products from {file_path}");
    Ok(())
}
