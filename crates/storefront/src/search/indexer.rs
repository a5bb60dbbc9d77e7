//! Background index builder.
//!
//! Loads searchable products from the database and rebuilds the index on a
//! fixed interval so stock and catalog changes show up without a restart.

use std::time::Duration;

use sqlx::PgPool;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument};

use super::{SearchError, SearchIndex};
use crate::db::ProductRepository;

/// Spawn a task that builds the index now and again every `refresh`.
///
/// Until the first build completes, searches return empty results. A failed
/// rebuild keeps serving the previous index.
pub fn start_indexing(search_index: SearchIndex, pool: PgPool, refresh: Duration) {
    info!(refresh_secs = refresh.as_secs(), "Spawning search index task");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match rebuild(&search_index, &pool).await {
                Ok(count) => info!(count, "Search index is ready"),
                Err(e) => error!(error = %e, "Failed to build search index"),
            }
        }
    });
}

/// Load products and swap in a fresh index. Returns the number indexed.
#[instrument(skip_all)]
async fn rebuild(search_index: &SearchIndex, pool: &PgPool) -> Result<usize, SearchError> {
    let products = ProductRepository::new(pool)
        .list_searchable()
        .await
        .map_err(|e| SearchError::Build(format!("Failed to load products: {e}")))?;

    let count = products.len();
    let (index, fields) =
        tokio::task::spawn_blocking(move || SearchIndex::build(&products))
            .await
            .map_err(|e| SearchError::Build(format!("Index task failed: {e}")))??;

    search_index.set_ready(&index, fields)?;
    Ok(count)
}
