//! Storefront route handlers.
//!
//! Public reads go through the storefront cache in [`AppState`]; writes
//! invalidate it.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pulse_threads_core::UserRole;

use crate::db::storefronts::STOREFRONTS_PER_PAGE;
use crate::db::{ProductRepository, StorefrontRepository};
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::RequireManager;
use crate::models::{
    CurrentUser, NewStorefront, PageRequest, Paginated, ProductView, Storefront, StorefrontSummary,
    StorefrontUpdate,
};
use crate::routes::access::check_storefront_owner;
use crate::state::AppState;
use crate::validation::ValidationErrors;

/// Query parameters for the storefront listing.
#[derive(Debug, Deserialize)]
pub struct StorefrontListQuery {
    pub page: Option<String>,
}

/// A storefront page: theme plus active products.
#[derive(Debug, Serialize)]
pub struct StorefrontPage {
    pub storefront: Storefront,
    pub products: Vec<ProductView>,
}

/// List active storefronts, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<StorefrontListQuery>,
) -> Result<Json<Paginated<StorefrontSummary>>> {
    let mut errors = ValidationErrors::new();
    let page = PageRequest::parse(
        query.page.as_deref(),
        None,
        STOREFRONTS_PER_PAGE,
        STOREFRONTS_PER_PAGE,
        &mut errors,
    );
    errors.into_result()?;

    let storefronts = StorefrontRepository::new(state.pool())
        .list_active(page)
        .await?;
    Ok(Json(storefronts))
}

/// Show an active storefront with its products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<StorefrontPage>> {
    let storefront = cached_storefront(&state, &slug).await?;
    if !storefront.is_active {
        return Err(AppError::NotFound("Storefront"));
    }

    let products = ProductRepository::new(state.pool())
        .list_for_storefront(storefront.id)
        .await?;
    Ok(Json(StorefrontPage {
        storefront,
        products,
    }))
}

/// Open a storefront.
///
/// Store owners always own what they create; admins may assign an owner.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    ApiJson(input): ApiJson<NewStorefront>,
) -> Result<(StatusCode, Json<Storefront>)> {
    let slug = input.validate()?;
    let owner = match user.role {
        UserRole::Admin => input.owner_id,
        _ => Some(user.id),
    };

    let storefront = StorefrontRepository::new(state.pool())
        .create(&input, &slug, owner)
        .await?;
    tracing::info!(storefront_id = %storefront.id, slug = %storefront.slug, "Storefront created");
    Ok((StatusCode::CREATED, Json(storefront)))
}

/// Update a storefront's details or theme.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(slug): Path<String>,
    ApiJson(input): ApiJson<StorefrontUpdate>,
) -> Result<Json<Storefront>> {
    let new_slug = input.validate()?;
    let current = owned_storefront(&state, &user, &slug).await?;

    let storefront = StorefrontRepository::new(state.pool())
        .update(current.id, &input, new_slug.as_deref())
        .await?;
    state.storefront_cache().invalidate(&slug).await;
    state.storefront_cache().invalidate(&storefront.slug).await;
    Ok(Json(storefront))
}

/// Soft-delete a storefront.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(slug): Path<String>,
) -> Result<StatusCode> {
    let current = owned_storefront(&state, &user, &slug).await?;
    StorefrontRepository::new(state.pool())
        .soft_delete(current.id)
        .await?;
    state.storefront_cache().invalidate(&slug).await;
    tracing::info!(storefront_id = %current.id, "Storefront deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn cached_storefront(state: &AppState, slug: &str) -> Result<Storefront> {
    if let Some(storefront) = state.storefront_cache().get(slug).await {
        return Ok(storefront);
    }
    let storefront = StorefrontRepository::new(state.pool())
        .get_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound("Storefront"))?;
    state
        .storefront_cache()
        .insert(slug.to_string(), storefront.clone())
        .await;
    Ok(storefront)
}

/// Load a storefront for editing, bypassing the cache.
async fn owned_storefront(
    state: &AppState,
    user: &CurrentUser,
    slug: &str,
) -> Result<Storefront> {
    let storefront = StorefrontRepository::new(state.pool())
        .get_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound("Storefront"))?;
    check_storefront_owner(user, &storefront)?;
    Ok(storefront)
}
