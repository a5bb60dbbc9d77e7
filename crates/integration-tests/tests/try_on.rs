//! Virtual try-on integration tests.
//!
//! These tests require a `PostgreSQL` database in `DATABASE_URL`.
//!
//! Run with: cargo test -p pulse-threads-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use pulse_threads_core::ClothingCategory;
use pulse_threads_integration_tests::{TestApp, create_product, multipart_body};
use pulse_threads_storefront::db::ProductRepository;
use pulse_threads_storefront::models::PriceChange;

async fn add_item(app: &mut TestApp, session_id: i64, product_id: i32, category: &str) -> Value {
    let response = app
        .post_json(
            "/api/try-on/add-item",
            &json!({
                "session_id": session_id,
                "product_id": product_id,
                "clothing_category": category,
                "size": "M",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    response.json()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_session_with_measurements() {
    let mut app = TestApp::with_database().await;
    let body = multipart_body(
        &[
            ("model_type", "user_photo"),
            ("body_measurements[height]", "168"),
            ("body_measurements[shoe_size]", "39.5"),
        ],
        Some(("user_photo", "me.jpg", "image/jpeg", b"\xFF\xD8\xFF\xE0fake")),
    );
    let response = app.post_multipart("/api/try-on/session", body).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    let created = response.json();
    assert_eq!(created["success"], true);
    assert_eq!(created["message"], "Try-on session created successfully");

    let id = created["session_id"].as_i64().unwrap();
    let session = app.get(&format!("/api/try-on/session/{id}")).await.json();
    assert_eq!(session["model_type"], "user_photo");
    assert_eq!(session["has_user_photo"], true);
    assert_eq!(session["body_measurements"]["height"], 168.0);
    assert_eq!(session["body_measurements"]["shoe_size"], 39.5);
    assert_eq!(session["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_new_top_replaces_old_top() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let first = create_product(&pool, None, Decimal::new(4500, 2), Some(ClothingCategory::Top)).await;
    let second = create_product(&pool, None, Decimal::new(5500, 2), Some(ClothingCategory::Top)).await;
    let session = app.start_try_on().await;

    let placed = add_item(&mut app, session, first.id.as_i32(), "top").await;
    assert!(placed["replaced_item_id"].is_null());
    let first_item = placed["item"]["id"].clone();

    let placed = add_item(&mut app, session, second.id.as_i32(), "top").await;
    assert_eq!(placed["replaced_item_id"], first_item);
    assert_eq!(placed["message"], "Item added to try-on session");

    let detail = app.get(&format!("/api/try-on/session/{session}")).await.json();
    assert_eq!(detail["item_count"], 1);
    assert_eq!(
        detail["outfit"]["garments"]["top"]["product"]["id"],
        second.id.as_i32()
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_accessories_accumulate() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let belt = create_product(&pool, None, Decimal::new(2000, 2), Some(ClothingCategory::Accessories)).await;
    let scarf = create_product(&pool, None, Decimal::new(3000, 2), Some(ClothingCategory::Accessories)).await;
    let shoes = create_product(&pool, None, Decimal::new(9000, 2), Some(ClothingCategory::Shoes)).await;
    let session = app.start_try_on().await;

    for product in [&belt, &scarf] {
        let placed = add_item(&mut app, session, product.id.as_i32(), "accessories").await;
        assert!(placed["replaced_item_id"].is_null());
    }
    add_item(&mut app, session, shoes.id.as_i32(), "shoes").await;

    let detail = app.get(&format!("/api/try-on/session/{session}")).await.json();
    assert_eq!(detail["item_count"], 3);
    assert_eq!(detail["outfit"]["accessories"].as_array().unwrap().len(), 2);
    assert!(detail["outfit"]["garments"]["shoes"].is_object());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_remove_item() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let jeans = create_product(&pool, None, Decimal::new(7999, 2), Some(ClothingCategory::Bottom)).await;
    let session = app.start_try_on().await;

    let placed = add_item(&mut app, session, jeans.id.as_i32(), "bottom").await;
    let item = placed["item"]["id"].clone();

    let body = json!({ "session_id": session, "item_id": item });
    let response = app
        .send_json(Method::DELETE, "/api/try-on/remove-item", &body)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "Item removed from try-on session");

    // Already gone
    let response = app
        .send_json(Method::DELETE, "/api/try-on/remove-item", &body)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let detail = app.get(&format!("/api/try-on/session/{session}")).await.json();
    assert_eq!(detail["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_sessions_are_private() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let top = create_product(&pool, None, Decimal::new(1000, 2), Some(ClothingCategory::Top)).await;
    let session = app.start_try_on().await;

    let mut stranger = app.fresh_browser();
    let response = stranger.get(&format!("/api/try-on/session/{session}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = stranger
        .post_json(
            "/api/try-on/add-item",
            &json!({ "session_id": session, "product_id": top.id.as_i32(), "clothing_category": "top" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = stranger
        .post_json("/api/try-on/add-all-to-cart", &json!({ "session_id": session }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_add_all_to_cart_adds_lines_each_time() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let top = create_product(&pool, None, Decimal::new(2500, 2), Some(ClothingCategory::Top)).await;
    let shoes = create_product(&pool, None, Decimal::new(7500, 2), Some(ClothingCategory::Shoes)).await;
    let session = app.start_try_on().await;
    add_item(&mut app, session, top.id.as_i32(), "top").await;
    add_item(&mut app, session, shoes.id.as_i32(), "shoes").await;

    for _ in 0..2 {
        let response = app
            .post_json("/api/try-on/add-all-to-cart", &json!({ "session_id": session }))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let body = response.json();
        assert_eq!(body["items_added"], 2);
        assert_eq!(body["message"], "All items added to cart successfully");
    }

    let cart = app.get("/api/cart").await.json();
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert!(items.iter().all(|i| i["quantity"] == 1));
    assert!(items.iter().all(|i| i["attributes"]["from_try_on"] == true));
    let subtotal: Decimal = cart["subtotal"].as_str().unwrap().parse().unwrap();
    assert_eq!(subtotal, Decimal::new(20000, 2));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_try_on_products_listing() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let top = create_product(&pool, None, Decimal::new(1500, 2), Some(ClothingCategory::Top)).await;
    let plain = create_product(&pool, None, Decimal::new(1500, 2), None).await;

    let response = app.get("/api/try-on/products").await;
    assert_eq!(response.status, StatusCode::OK);
    let ids: Vec<i64> = response
        .json()
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_i64())
        .collect();
    assert!(ids.contains(&i64::from(top.id.as_i32())));
    assert!(!ids.contains(&i64::from(plain.id.as_i32())));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_bulk_add_prices_lines_like_cart_add() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let top = create_product(&pool, None, Decimal::new(10000, 2), Some(ClothingCategory::Top)).await;
    let sale = PriceChange {
        price: Some(Decimal::new(10000, 2)),
        sale_price: Some(Some(Decimal::new(8000, 2))),
        reason: None,
    };
    ProductRepository::new(&pool)
        .update_price(top.id, &sale, None)
        .await
        .unwrap();

    let session = app.start_try_on().await;
    add_item(&mut app, session, top.id.as_i32(), "top").await;
    app.post_json("/api/try-on/add-all-to-cart", &json!({ "session_id": session }))
        .await;
    app.post_json("/api/cart", &json!({ "product_id": top.id }))
        .await;

    let cart = app.get("/api/cart").await.json();
    let prices: Vec<Decimal> = cart["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["price"].as_str().unwrap().parse().unwrap())
        .collect();
    assert_eq!(prices, vec![Decimal::new(8000, 2), Decimal::new(8000, 2)]);
}
