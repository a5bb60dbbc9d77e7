//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use pulse_threads_core::{ProductId, VariationId};

use crate::db::{
    PriceHistoryRepository, ProductRepository, StorefrontRepository, VariationRepository,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::RequireManager;
use crate::models::{
    CurrentUser, NewProduct, Paginated, PriceChange, PriceHistoryEntry, Priceable, Product,
    ProductDetail, ProductFilter, ProductListQuery, ProductUpdate, ProductView, VariationView,
};
use crate::routes::access::ManageScope;
use crate::state::AppState;
use crate::validation::ValidationErrors;

/// List products with filters, sorting, and pagination.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Paginated<ProductView>>> {
    let (filter, page) = ProductFilter::parse(&query)?;
    let products = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(products))
}

/// Product detail with variations, features, and the default variation.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    Ok(Json(ProductRepository::new(state.pool()).detail(id).await?))
}

/// Variations of a product.
#[instrument(skip(state))]
pub async fn variations(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<VariationView>>> {
    live_product(&state, id).await?;
    let variations = VariationRepository::new(state.pool())
        .list_for_product(id)
        .await?;
    Ok(Json(variations.into_iter().map(VariationView::from).collect()))
}

/// Price changes of a product, newest first.
#[instrument(skip(state))]
pub async fn price_history(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<PriceHistoryEntry>>> {
    live_product(&state, id).await?;
    let history = PriceHistoryRepository::new(state.pool())
        .list_for(Priceable::Product, id.as_i32())
        .await?;
    Ok(Json(history))
}

/// Create a product in the manager's storefront.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<ProductView>)> {
    input.validate()?;
    let storefront = match ManageScope::resolve(&state, &user).await? {
        ManageScope::Everything => input.storefront_id,
        ManageScope::Storefront(own) => Some(own),
    };
    if let Some(id) = storefront {
        StorefrontRepository::new(state.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| {
                ValidationErrors::single("storefront_id", "The selected storefront id is invalid.")
            })?;
    }

    let product = ProductRepository::new(state.pool())
        .create(&input, storefront)
        .await?;
    tracing::info!(product_id = %product.id, sku = %product.sku, "Product created");
    let product_id = product.id.to_string();
    add_breadcrumb(
        "catalog",
        "Product created",
        Some(&[("product_id", product_id.as_str())]),
    );
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Partially update a product. Price changes are recorded in its history.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<ProductId>,
    ApiJson(input): ApiJson<ProductUpdate>,
) -> Result<Json<ProductView>> {
    input.validate()?;
    authorize(&state, &user, id).await?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input, Some(user.id))
        .await?;
    Ok(Json(product.into()))
}

/// Soft-delete a product.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    authorize(&state, &user, id).await?;
    ProductRepository::new(state.pool()).soft_delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Change a product's price and sale price.
#[instrument(skip(state, user, change), fields(user_id = %user.id))]
pub async fn update_price(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<ProductId>,
    ApiJson(change): ApiJson<PriceChange>,
) -> Result<Json<ProductView>> {
    change.validate()?;
    authorize(&state, &user, id).await?;
    let product = ProductRepository::new(state.pool())
        .update_price(id, &change, Some(user.id))
        .await?;
    Ok(Json(product.into()))
}

/// Change a variation's price and sale price.
#[instrument(skip(state, user, change), fields(user_id = %user.id))]
pub async fn update_variation_price(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path((id, variation_id)): Path<(ProductId, VariationId)>,
    ApiJson(change): ApiJson<PriceChange>,
) -> Result<Json<VariationView>> {
    change.validate()?;
    authorize(&state, &user, id).await?;
    let variation = VariationRepository::new(state.pool())
        .update_price(id, variation_id, &change, Some(user.id))
        .await?;
    Ok(Json(variation.into()))
}

/// Make one variation the product's default, clearing the previous one.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn set_default_variation(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path((id, variation_id)): Path<(ProductId, VariationId)>,
) -> Result<Json<VariationView>> {
    authorize(&state, &user, id).await?;
    let variation = VariationRepository::new(state.pool())
        .set_default(id, variation_id)
        .await?;
    Ok(Json(variation.into()))
}

/// The product, if it exists and is not deleted.
async fn live_product(state: &AppState, id: ProductId) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or(AppError::NotFound("Product"))
}

/// Load the product and check the manager may edit it.
async fn authorize(state: &AppState, user: &CurrentUser, id: ProductId) -> Result<()> {
    let product = live_product(state, id).await?;
    ManageScope::resolve(state, user)
        .await?
        .check(product.storefront_id)
}
