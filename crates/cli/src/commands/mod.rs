//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by every command that talks to the database.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read the mall database URL, preferring `MALL_DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("MALL_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("MALL_DATABASE_URL"))
}

/// Connect to the mall database.
pub async fn connect() -> Result<PgPool, CommandError> {
    let database_url = database_url()?;
    tracing::info!("Connecting to mall database...");
    Ok(pulse_threads_storefront::db::create_pool(&database_url).await?)
}
