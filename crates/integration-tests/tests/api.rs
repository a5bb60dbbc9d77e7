//! API tests that never reach the database.
//!
//! Every request here is answered by validation, auth, or an in-memory
//! service, so the lazily connected pool stays idle.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use pulse_threads_core::UserRole;
use pulse_threads_integration_tests::{TestApp, multipart_body, session_user};

// ============================================================================
// Health & request IDs
// ============================================================================

#[tokio::test]
async fn test_health() {
    let mut app = TestApp::new();
    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ok");
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-7f3a")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "edge-7f3a");
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn test_chat_replies() {
    let mut app = TestApp::new();
    let response = app
        .post_json("/api/chat", &json!({ "message": "Hello there" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["message"], "Hello! How can I help you today?");
    assert_eq!(body["expression"], "neutral");
    assert!(body["audio_url"].is_null());
}

#[tokio::test]
async fn test_chat_requires_message() {
    let mut app = TestApp::new();

    for body in [json!({}), json!({ "message": "   " }), json!({ "message": null })] {
        let response = app.post_json("/api/chat", &body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json(), json!({ "error": "Message is required" }));
    }

    let response = app
        .request(
            Method::POST,
            "/api/chat",
            Some("text/plain"),
            Body::from("hello"),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Message is required");
}

#[tokio::test]
async fn test_chat_is_rate_limited() {
    let mut app = TestApp::new();
    let mut statuses = Vec::new();
    for _ in 0..15 {
        let response = app
            .post_json("/api/chat", &json!({ "message": "hi" }))
            .await;
        statuses.push(response.status);
    }

    assert_eq!(statuses.first(), Some(&StatusCode::OK));
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_requires_query() {
    let mut app = TestApp::new();

    for uri in ["/api/search", "/api/search?query=", "/api/search?query=%20%20"] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
        let body = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["query"][0], "The query field is required.");
    }
}

#[tokio::test]
async fn test_search_before_index_is_built() {
    let mut app = TestApp::new();
    let response = app.get("/api/search?query=denim&page=2").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["total"], 0);
    assert_eq!(body["current_page"], 2);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["data"], json!([]));
}

// ============================================================================
// Catalog management auth
// ============================================================================

#[tokio::test]
async fn test_management_requires_sign_in() {
    let mut app = TestApp::new();
    let product = json!({ "name": "Jacket", "sku": "J-1", "price": "10.00", "stock_quantity": 1 });

    let response = app.post_json("/api/products", &product).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .post_json("/api/storefronts", &json!({ "name": "Shop" }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customers_cannot_manage_catalog() {
    let mut app = TestApp::new();
    app.sign_in(&session_user(41, "shopper@example.com", UserRole::Customer))
        .await;

    let response = app
        .post_json(
            "/api/products",
            &json!({ "name": "Jacket", "sku": "J-1", "price": "10.00", "stock_quantity": 1 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .send_json(Method::PATCH, "/api/products/1/price", &json!({ "price": "5.00" }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_prices_beyond_column_limit_are_rejected() {
    let mut app = TestApp::new();
    app.sign_in(&session_user(7, "admin@example.com", UserRole::Admin))
        .await;

    let response = app
        .post_json(
            "/api/products",
            &json!({ "name": "Jacket", "sku": "J-1", "price": "100000000000", "stock_quantity": 1 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["errors"]["price"][0],
        "The price field must not be greater than 9999999999.99."
    );

    let response = app
        .send_json(
            Method::PATCH,
            "/api/products/1/price",
            &json!({ "price": "5.00", "sale_price": "99999999999" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["errors"]["sale_price"].is_array());
}

// ============================================================================
// Try-on validation
// ============================================================================

#[tokio::test]
async fn test_try_on_user_photo_mode_needs_photo() {
    let mut app = TestApp::new();
    let body = multipart_body(&[("model_type", "user_photo")], None);
    let response = app.post_multipart("/api/try-on/session", body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors = &response.json()["errors"];
    assert_eq!(
        errors["user_photo"][0],
        "The user photo field is required when model type is user_photo."
    );
}

#[tokio::test]
async fn test_try_on_rejects_bad_form() {
    let mut app = TestApp::new();
    let body = multipart_body(
        &[
            ("model_type", "hologram"),
            ("body_measurements[height]", "tall"),
        ],
        Some(("user_photo", "resume.pdf", "application/pdf", b"%PDF-1.4")),
    );
    let response = app.post_multipart("/api/try-on/session", body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors = &response.json()["errors"];
    assert!(errors["model_type"].is_array());
    assert!(errors["user_photo"].is_array());
    assert!(errors["body_measurements.height"].is_array());
}

#[tokio::test]
async fn test_try_on_add_item_rejects_unknown_category() {
    let mut app = TestApp::new();
    let response = app
        .post_json(
            "/api/try-on/add-item",
            &json!({ "session_id": 1, "product_id": 1, "clothing_category": "hat" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["errors"]["clothing_category"].is_array());
}

// ============================================================================
// Cart & checkout validation
// ============================================================================

#[tokio::test]
async fn test_cart_quantity_must_be_positive() {
    let mut app = TestApp::new();
    let response = app
        .post_json("/api/cart", &json!({ "product_id": 1, "quantity": 0 }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["errors"]["quantity"][0],
        "The quantity field must be at least 1."
    );
}

#[tokio::test]
async fn test_checkout_reports_every_missing_field() {
    let mut app = TestApp::new();
    let response = app
        .post_json("/api/checkout", &json!({ "payment_method": "cash" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors = response.json()["errors"].clone();
    for field in ["email", "name", "address", "city"] {
        assert!(errors[field].is_array(), "{field} missing from {errors}");
    }
    assert_eq!(
        errors["payment_method"][0],
        "The selected payment method is invalid."
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let mut app = TestApp::new();
    let response = app
        .request(
            Method::POST,
            "/api/cart",
            Some("application/json"),
            Body::from("{not json"),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["success"], false);
}
