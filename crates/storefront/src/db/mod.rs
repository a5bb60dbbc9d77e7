//! Database operations for the mall `PostgreSQL` schema.
//!
//! # Schema: `mall`
//!
//! ## Tables
//!
//! - `user` - Mall users and their roles
//! - `storefront` - Tenant shops (soft delete)
//! - `product`, `product_feature` - Catalog (soft delete)
//! - `product_variation` - Per-product variants, one default at most
//! - `price_history` - Append-only log of price changes
//! - `cart`, `cart_item` - Carts owned by a user or an anonymous session token
//! - `try_on_session`, `try_on_item` - Virtual try-on state
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p pulse-threads-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate builds
//! without a live database.

pub mod carts;
pub mod price_history;
pub mod products;
pub mod storefronts;
pub mod try_on;
pub mod users;
pub mod variations;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use price_history::PriceHistoryRepository;
pub use products::ProductRepository;
pub use storefronts::StorefrontRepository;
pub use try_on::TryOnRepository;
pub use users::UserRepository;
pub use variations::VariationRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found. Holds the entity name.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Constraint violation (e.g., unique sku).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Parse a text column into a domain enum, reporting bad values as corruption.
pub(crate) fn parse_column<T>(value: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| RepositoryError::DataCorruption(e.to_string()))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
