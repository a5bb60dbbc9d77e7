//! Cart route handlers.
//!
//! The cart belongs to whoever [`CurrentOwner`] resolves: the signed-in user
//! or the anonymous shopper token in the session.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use tracing::instrument;

use pulse_threads_core::CartItemId;

use crate::db::CartRepository;
use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::CurrentOwner;
use crate::models::{AddToCart, Cart, UpdateQuantity, validate_quantity};
use crate::state::AppState;

/// The caller's cart with totals.
#[instrument(skip(state, owner))]
pub async fn show(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
) -> Result<Json<Cart>> {
    Ok(Json(CartRepository::new(state.pool()).get(&owner).await?))
}

/// Add a product, merging with an identical line.
#[instrument(skip(state, owner))]
pub async fn add(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    ApiJson(input): ApiJson<AddToCart>,
) -> Result<Json<Cart>> {
    validate_quantity(input.quantity)?;
    let cart = CartRepository::new(state.pool()).add(&owner, &input).await?;
    tracing::debug!(product_id = %input.product_id, quantity = input.quantity, "Added to cart");
    Ok(Json(cart))
}

/// Set the quantity of one line.
#[instrument(skip(state, owner))]
pub async fn update(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    Path(item_id): Path<CartItemId>,
    ApiJson(input): ApiJson<UpdateQuantity>,
) -> Result<Json<Cart>> {
    validate_quantity(input.quantity)?;
    let cart = CartRepository::new(state.pool())
        .update_quantity(&owner, item_id, input.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove one line.
#[instrument(skip(state, owner))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool())
        .remove(&owner, item_id)
        .await?;
    Ok(Json(cart))
}

/// Empty the cart.
#[instrument(skip(state, owner))]
pub async fn clear(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
) -> Result<Json<Value>> {
    let removed = CartRepository::new(state.pool()).clear(&owner).await?;
    tracing::debug!(removed, "Cart cleared");
    Ok(Json(json!({
        "message": "Cart cleared successfully",
        "removed": removed,
    })))
}
