//! Checkout route handler.
//!
//! Places an order from the caller's cart. No payment is taken; the order
//! summary is the receipt.

use axum::{Json, extract::State};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::instrument;

use crate::db::CartRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::CurrentOwner;
use crate::models::{CheckoutRequest, OrderSummary};
use crate::state::AppState;

/// Prefix of every order number.
const ORDER_PREFIX: &str = "PT-";
/// Random characters after the prefix.
const ORDER_SUFFIX_LENGTH: usize = 10;

/// Validate the checkout form, empty the cart, and return the order summary.
#[instrument(skip(state, owner, request))]
pub async fn place_order(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<OrderSummary>> {
    let details = request.validate()?;

    let cart = CartRepository::new(state.pool()).take(&owner).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty.".to_string()));
    }

    let summary = OrderSummary::new(order_number(), details, cart);
    tracing::info!(
        order_number = %summary.order_number,
        total = %summary.total,
        payment_method = summary.payment_method.as_str(),
        "Order placed"
    );
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", summary.order_number.as_str())]),
    );
    Ok(Json(summary))
}

/// A fresh order number such as `PT-7KQ2M9XA4B`.
fn order_number() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ORDER_SUFFIX_LENGTH)
        .map(char::from)
        .collect();
    format!("{ORDER_PREFIX}{}", suffix.to_ascii_uppercase())
}
