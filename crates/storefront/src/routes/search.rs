//! Search route handler.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::models::{PageRequest, Paginated};
use crate::search::{RESULTS_PER_PAGE, SearchHit};
use crate::state::AppState;
use crate::validation::ValidationErrors;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub page: Option<String>,
}

/// Full-text product search, ten hits per page.
///
/// Returns an empty page while the index is still being built.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Paginated<SearchHit>>> {
    let mut errors = ValidationErrors::new();
    let query = params.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        errors.add("query", "The query field is required.");
    }
    let page = PageRequest::parse(
        params.page.as_deref(),
        None,
        RESULTS_PER_PAGE,
        RESULTS_PER_PAGE,
        &mut errors,
    );
    errors.into_result()?;

    if !state.search().is_ready() {
        tracing::debug!(query, "Search index not built yet");
    }
    let results = state.search().search(query, page)?;
    tracing::debug!(query, total = results.total, "Search complete");
    Ok(Json(results))
}
