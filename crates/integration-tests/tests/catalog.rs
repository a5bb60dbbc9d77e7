//! Catalog and storefront integration tests.
//!
//! These tests require a `PostgreSQL` database in `DATABASE_URL`.
//!
//! Run with: cargo test -p pulse-threads-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use pulse_threads_core::UserRole;
use pulse_threads_integration_tests::{
    TestApp, create_product, create_storefront, create_user, unique,
};
use pulse_threads_storefront::db::VariationRepository;
use pulse_threads_storefront::models::NewVariation;

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

fn product_ids(page: &Value) -> Vec<i64> {
    page["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_i64())
        .collect()
}

// ============================================================================
// Listing filters
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_price_bounds_are_inclusive() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let shop = create_storefront(&pool, None).await;
    let mut ids = Vec::new();
    for cents in [1000, 2000, 5000, 6000, 9000] {
        let product = create_product(&pool, Some(&shop), Decimal::new(cents, 2), None).await;
        ids.push(i64::from(product.id.as_i32()));
    }

    let page = app
        .get(&format!(
            "/api/products?storefront={}&min_price=20&max_price=60",
            shop.slug
        ))
        .await
        .json();
    assert_eq!(page["total"], 3);
    let found = product_ids(&page);
    assert_eq!(found, ids.get(1..4).unwrap().to_vec());
    assert!(
        page["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|p| (Decimal::new(20, 0)..=Decimal::new(60, 0)).contains(&decimal(&p["price"])))
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_inverted_price_bounds_are_rejected() {
    let mut app = TestApp::with_database().await;
    let response = app.get("/api/products?min_price=80&max_price=10").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Variations
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_default_variation_moves() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let admin = create_user(&pool, UserRole::Admin).await;
    let product = create_product(&pool, None, Decimal::new(8999, 2), None).await;

    let variations = VariationRepository::new(&pool);
    let mut created = Vec::new();
    for (size, is_default) in [("S", true), ("M", false), ("L", false)] {
        let input = NewVariation {
            sku: unique("VAR"),
            size: Some(size.to_string()),
            price: Decimal::new(8999, 2),
            stock_quantity: 3,
            is_default,
            ..NewVariation::default()
        };
        created.push(variations.create(product.id, &input).await.unwrap());
    }
    let medium = created.get(1).unwrap();

    app.sign_in(&admin).await;
    let response = app
        .post_json(
            &format!("/api/products/{}/variations/{}/default", product.id, medium.id),
            &json!({}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(response.json()["is_default"], true);

    let listed = app
        .get(&format!("/api/products/{}/variations", product.id))
        .await
        .json();
    let defaults: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .filter(|v| v["is_default"] == true)
        .filter_map(|v| v["size"].as_str())
        .collect();
    assert_eq!(defaults, vec!["M"]);

    let detail = app.get(&format!("/api/products/{}", product.id)).await.json();
    assert_eq!(detail["default_variation"]["size"], "M");
}

// ============================================================================
// Prices
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_price_change_is_logged() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let admin = create_user(&pool, UserRole::Admin).await;
    let product = create_product(&pool, None, Decimal::new(5000, 2), None).await;

    app.sign_in(&admin).await;
    let response = app
        .send_json(
            Method::PATCH,
            &format!("/api/products/{}/price", product.id),
            &json!({ "price": "45.00", "sale_price": "39.00", "reason": "Winter sale" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    let view = response.json();
    assert_eq!(decimal(&view["current_price"]), Decimal::new(3900, 2));
    assert_eq!(view["is_on_sale"], true);

    let history = app
        .get(&format!("/api/products/{}/price-history", product.id))
        .await
        .json();
    let latest = history.as_array().unwrap().first().unwrap().clone();
    assert_eq!(decimal(&latest["old_price"]), Decimal::new(5000, 2));
    assert_eq!(decimal(&latest["new_price"]), Decimal::new(4500, 2));
    assert_eq!(latest["reason"], "Winter sale");
    assert_eq!(latest["changed_by"], admin.id.as_i32());
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_store_owner_manages_only_own_products() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let owner = create_user(&pool, UserRole::StoreOwner).await;
    let rival = create_user(&pool, UserRole::StoreOwner).await;
    let own_shop = create_storefront(&pool, Some(&owner)).await;
    let rival_shop = create_storefront(&pool, Some(&rival)).await;
    let own = create_product(&pool, Some(&own_shop), Decimal::new(1000, 2), None).await;
    let theirs = create_product(&pool, Some(&rival_shop), Decimal::new(1000, 2), None).await;

    app.sign_in(&owner).await;
    let rename = json!({ "name": "Renamed" });

    let response = app
        .send_json(Method::PUT, &format!("/api/products/{}", own.id), &rename)
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(response.json()["name"], "Renamed");

    let response = app
        .send_json(Method::PUT, &format!("/api/products/{}", theirs.id), &rename)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .send_json(
            Method::PUT,
            &format!("/api/storefronts/{}", rival_shop.slug),
            &json!({ "description": "Mine now" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_created_product_lands_in_owners_storefront() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let owner = create_user(&pool, UserRole::StoreOwner).await;
    let shop = create_storefront(&pool, Some(&owner)).await;

    app.sign_in(&owner).await;
    let response = app
        .post_json(
            "/api/products",
            &json!({
                "name": "Chitenge Wrap Dress",
                "sku": unique("CWD"),
                "price": "59.99",
                "stock_quantity": 6,
                "clothing_category": "full_outfit",
                "is_try_on_enabled": true,
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    assert_eq!(response.json()["storefront_id"], shop.id.as_i32());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_unknown_storefront_is_a_field_error() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let admin = create_user(&pool, UserRole::Admin).await;

    app.sign_in(&admin).await;
    let response = app
        .post_json(
            "/api/products",
            &json!({
                "name": "Orphan Shirt",
                "sku": unique("ORP"),
                "price": "25.00",
                "stock_quantity": 2,
                "storefront_id": 987_654,
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", response.text());
    assert_eq!(
        response.json()["errors"]["storefront_id"][0],
        "The selected storefront id is invalid."
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_deleted_product_disappears() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let admin = create_user(&pool, UserRole::Admin).await;
    let product = create_product(&pool, None, Decimal::new(1000, 2), None).await;

    app.sign_in(&admin).await;
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/products/{}", product.id),
            None,
            axum::body::Body::empty(),
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.get(&format!("/api/products/{}", product.id)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Storefront pages
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_storefront_page_lists_products() {
    let mut app = TestApp::with_database().await;
    let pool = app.pool().clone();
    let shop = create_storefront(&pool, None).await;
    let product = create_product(&pool, Some(&shop), Decimal::new(1000, 2), None).await;

    let response = app.get(&format!("/api/storefronts/{}", shop.slug)).await;
    assert_eq!(response.status, StatusCode::OK);
    let page = response.json();
    assert_eq!(page["storefront"]["slug"], shop.slug.as_str());
    let listed: Vec<i64> = page["products"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_i64())
        .collect();
    assert_eq!(listed, vec![i64::from(product.id.as_i32())]);

    let response = app.get("/api/storefronts/no-such-shop").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
