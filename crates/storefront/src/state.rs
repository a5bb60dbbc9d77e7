//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::models::Storefront;
use crate::search::SearchIndex;
use crate::services::Assistant;

/// How long a storefront page stays cached after it is loaded.
const STOREFRONT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid assistant rule: {0}")]
    Assistant(#[from] regex::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the pool, config, search index,
/// assistant, and the storefront cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    search: SearchIndex,
    assistant: Assistant,
    storefronts: Cache<String, Storefront>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the assistant rules fail to compile.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let storefronts = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(STOREFRONT_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                search: SearchIndex::new(),
                assistant: Assistant::new()?,
                storefronts,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the product search index.
    #[must_use]
    pub fn search(&self) -> &SearchIndex {
        &self.inner.search
    }

    #[must_use]
    pub fn assistant(&self) -> &Assistant {
        &self.inner.assistant
    }

    /// Storefronts by slug. Invalidate on every write.
    #[must_use]
    pub fn storefront_cache(&self) -> &Cache<String, Storefront> {
        &self.inner.storefronts
    }

    /// Start the background search index build and refresh loop.
    pub fn start_search_indexing(&self) {
        crate::search::start_indexing(
            self.search().clone(),
            self.pool().clone(),
            self.config().search_refresh,
        );
    }
}
