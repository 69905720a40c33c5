//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! cw-cli migrate
//! ```
//!
//! Applies the storefront schema (`crates/storefront/migrations/`) and then
//! creates the tower-sessions table the cart is persisted in.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for storefront

use cartwheel_storefront::{db, middleware};
use tracing::info;

use super::{CommandError, database_url};

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails to apply.
pub async fn storefront() -> Result<(), CommandError> {
    let database_url = database_url()?;

    info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running storefront migrations...");
    db::MIGRATOR.run(&pool).await?;

    info!("Creating session table...");
    middleware::create_session_store(&pool).migrate().await?;

    info!("Storefront migrations complete!");
    Ok(())
}
