//! Cart and checkout integration tests.
//!
//! These tests require a `PostgreSQL` database in `DATABASE_URL`.
//!
//! Run with: cargo test -p pulse-threads-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use pulse_threads_core::UserRole;
use pulse_threads_integration_tests::{TestApp, create_product, create_user};

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

fn checkout_form() -> Value {
    json!({
        "email": "mwila@example.com",
        "name": "Mwila Banda",
        "address": "Plot 12, Cairo Road",
        "city": "Lusaka",
        "payment_method": "credit",
    })
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_identical_lines_merge() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let product = create_product(&pool, None, Decimal::new(1250, 2), None).await;

    let line = json!({ "product_id": product.id, "quantity": 1, "attributes": { "size": "M" } });
    app.post_json("/api/cart", &line).await;
    let cart = app.post_json("/api/cart", &line).await.json();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["item_count"], 2);

    let other_size = json!({ "product_id": product.id, "attributes": { "size": "L" } });
    let cart = app.post_json("/api/cart", &other_size).await.json();
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    assert_eq!(cart["item_count"], 3);
    assert_eq!(decimal(&cart["subtotal"]), Decimal::new(3750, 2));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_line_quantity_is_bounded() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let product = create_product(&pool, None, Decimal::new(100, 2), None).await;

    let huge = json!({ "product_id": product.id, "quantity": 2_147_483_000 });
    let response = app.post_json("/api/cart", &huge).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["errors"]["quantity"].is_array());

    let most = json!({ "product_id": product.id, "quantity": 99 });
    app.post_json("/api/cart", &most).await;
    let response = app.post_json("/api/cart", &most).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    let cart = response.json();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["item_count"], 99);

    let line_id = cart["items"][0]["id"].as_i64().unwrap();
    let response = app
        .send_json(
            Method::PATCH,
            &format!("/api/cart/item/{line_id}"),
            &json!({ "quantity": 100 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_carts_belong_to_their_browser() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let product = create_product(&pool, None, Decimal::new(999, 2), None).await;

    let cart = app
        .post_json("/api/cart", &json!({ "product_id": product.id }))
        .await
        .json();
    let line_id = cart["items"][0]["id"].as_i64().unwrap();

    let mut stranger = app.fresh_browser();
    let theirs = stranger.get("/api/cart").await.json();
    assert_eq!(theirs["items"], json!([]));

    let response = stranger
        .send_json(
            Method::PATCH,
            &format!("/api/cart/item/{line_id}"),
            &json!({ "quantity": 5 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = stranger
        .request(
            Method::DELETE,
            &format!("/api/cart/item/{line_id}"),
            None,
            Body::empty(),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let mine = app.get("/api/cart").await.json();
    assert_eq!(mine["item_count"], 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_signed_in_cart_follows_the_user() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let user = create_user(&pool, UserRole::Customer).await;
    let product = create_product(&pool, None, Decimal::new(2000, 2), None).await;

    app.sign_in(&user).await;
    app.post_json("/api/cart", &json!({ "product_id": product.id, "quantity": 2 }))
        .await;

    let mut phone = app.fresh_browser();
    phone.sign_in(&user).await;
    let cart = phone.get("/api/cart").await.json();
    assert_eq!(cart["item_count"], 2);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_update_and_clear() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let product = create_product(&pool, None, Decimal::new(500, 2), None).await;

    let cart = app
        .post_json("/api/cart", &json!({ "product_id": product.id }))
        .await
        .json();
    let line_id = cart["items"][0]["id"].as_i64().unwrap();

    let cart = app
        .send_json(
            Method::PATCH,
            &format!("/api/cart/item/{line_id}"),
            &json!({ "quantity": 4 }),
        )
        .await
        .json();
    assert_eq!(cart["item_count"], 4);
    assert_eq!(decimal(&cart["subtotal"]), Decimal::new(2000, 2));

    let response = app
        .request(Method::DELETE, "/api/cart", None, Body::empty())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["message"], "Cart cleared successfully");
    assert_eq!(body["removed"], 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_empties_cart() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let product = create_product(&pool, None, Decimal::new(4000, 2), None).await;
    app.post_json("/api/cart", &json!({ "product_id": product.id, "quantity": 2 }))
        .await;

    let response = app.post_json("/api/checkout", &checkout_form()).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    let order = response.json();
    assert!(order["order_number"].as_str().unwrap().starts_with("PT-"));
    assert_eq!(order["payment_method"], "credit");
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    let subtotal = decimal(&order["subtotal"]);
    assert_eq!(subtotal, Decimal::new(8000, 2));
    assert_eq!(decimal(&order["total"]), subtotal + decimal(&order["shipping"]));

    let cart = app.get("/api/cart").await.json();
    assert_eq!(cart["items"], json!([]));

    let response = app.post_json("/api/checkout", &checkout_form()).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Your cart is empty.");
}
