//! Database migration command.
//!
//! Applies `crates/storefront/migrations/` to the database named by
//! `MALL_DATABASE_URL`. Already applied migrations are skipped.

use thiserror::Error;

use super::CommandError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run every pending migration.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration cannot be applied.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    tracing::info!("Running mall migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Mall migrations complete!");
    Ok(())
}
