//! HTTP route handlers for the mall API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                      - Liveness
//! GET    /health/ready                                - Database check
//!
//! # Catalog
//! GET    /api/products                                - List with filters
//! POST   /api/products                                - Create (manager)
//! GET    /api/products/{id}                           - Detail
//! PUT    /api/products/{id}                           - Update (manager)
//! DELETE /api/products/{id}                           - Soft delete (manager)
//! PATCH  /api/products/{id}/price                     - Change price (manager)
//! GET    /api/products/{id}/price-history             - Price log
//! GET    /api/products/{id}/variations                - Variations
//! PATCH  /api/products/{id}/variations/{vid}/price    - Change variation price (manager)
//! POST   /api/products/{id}/variations/{vid}/default  - Make default (manager)
//!
//! # Storefronts
//! GET    /api/storefronts                             - Active storefronts
//! POST   /api/storefronts                             - Create (manager)
//! GET    /api/storefronts/{slug}                      - Storefront page
//! PUT    /api/storefronts/{slug}                      - Update (owner)
//! DELETE /api/storefronts/{slug}                      - Soft delete (owner)
//!
//! # Cart & checkout
//! GET    /api/cart                                    - Cart
//! POST   /api/cart                                    - Add line
//! DELETE /api/cart                                    - Clear
//! PATCH  /api/cart/item/{id}                          - Set quantity
//! DELETE /api/cart/item/{id}                          - Remove line
//! POST   /api/checkout                                - Place order (rate limited)
//!
//! # Discovery
//! GET    /api/search                                  - Full-text search
//! POST   /api/chat                                    - Assistant (rate limited)
//!
//! # Try-on
//! GET    /api/try-on/products                         - Try-on products
//! POST   /api/try-on/session                          - Start session (multipart)
//! GET    /api/try-on/session/{id}                     - Session with outfit
//! POST   /api/try-on/add-item                         - Dress the model
//! DELETE /api/try-on/remove-item                      - Undress one item
//! POST   /api/try-on/add-all-to-cart                  - Outfit to cart
//! ```

pub mod access;
pub mod cart;
pub mod chat;
pub mod checkout;
pub mod health;
pub mod products;
pub mod search;
pub mod storefronts;
pub mod try_on;

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::middleware::{chat_rate_limiter, checkout_rate_limiter, request_id_middleware};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/{id}/price", patch(products::update_price))
        .route("/{id}/price-history", get(products::price_history))
        .route("/{id}/variations", get(products::variations))
        .route(
            "/{id}/variations/{variation_id}/price",
            patch(products::update_variation_price),
        )
        .route(
            "/{id}/variations/{variation_id}/default",
            post(products::set_default_variation),
        )
}

/// Create the storefront routes router.
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(storefronts::index).post(storefronts::create))
        .route(
            "/{slug}",
            get(storefronts::show)
                .put(storefronts::update)
                .delete(storefronts::destroy),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).delete(cart::clear))
        .route("/item/{id}", patch(cart::update).delete(cart::remove))
}

/// Create the try-on routes router.
pub fn try_on_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(try_on::products))
        .route(
            "/session",
            post(try_on::create_session)
                .layer(DefaultBodyLimit::max(try_on::SESSION_BODY_LIMIT)),
        )
        .route("/session/{id}", get(try_on::show_session))
        .route("/add-item", post(try_on::add_item))
        .route("/remove-item", delete(try_on::remove_item))
        .route("/add-all-to-cart", post(try_on::add_all_to_cart))
}

/// Create the chat router: rate limited, with panics turned into an apology.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(chat::send))
        .layer(CatchPanicLayer::custom(chat::panic_response))
        .layer(chat_rate_limiter())
}

/// Create the checkout router (rate limited).
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/api/checkout", post(checkout::place_order))
        .layer(checkout_rate_limiter())
}

/// Create all routes for the mall API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/products", product_routes())
        .nest("/api/storefronts", storefront_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/try-on", try_on_routes())
        .route("/api/search", get(search::search))
        .merge(chat_routes())
        .merge(checkout_routes())
}

/// The full application: routes, sessions, request IDs, and tracing.
///
/// Sentry layers are added by the binary so tests can build the app without
/// a Sentry client.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    with_middleware(routes(), state, sessions)
}

/// Wrap any router in the session, request ID, and tracing layers.
pub fn with_middleware<S>(
    router: Router<AppState>,
    state: AppState,
    sessions: SessionManagerLayer<S>,
) -> Router
where
    S: SessionStore + Clone,
{
    router
        .layer(sessions)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
