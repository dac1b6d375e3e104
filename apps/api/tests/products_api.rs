mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_banner_and_health() {
    let app = TestApp::new().await;

    let res = app.get("/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["message"], "SmartStock Inventory Management API");

    let res = app.get("/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["database"], "ok");
}

#[tokio::test]
async fn test_product_crud() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/products",
            json!({
                "name": "Wireless Mouse",
                "sku": "wm-001",
                "category": "Electronics",
                "priceCents": 2599,
                "stock": 12
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let created = res.json();
    assert_eq!(created["sku"], "WM-001");
    assert_eq!(created["minStock"], 10);
    let id = created["id"].as_str().unwrap().to_string();

    let res = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["name"], "Wireless Mouse");

    let res = app
        .put(
            &format!("/api/products/{id}"),
            json!({
                "name": "Wireless Mouse Pro",
                "sku": "WM-001",
                "category": "Electronics",
                "priceCents": 2999,
                "stock": 12
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["priceCents"], 2999);

    let res = app.get("/api/products").await;
    assert_eq!(res.json().as_array().unwrap().len(), 1);

    let res = app.delete(&format!("/api/products/{id}")).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_sku_conflict() {
    let app = TestApp::new().await;
    app.create_product("DUP-1", 100, 1).await;

    let res = app
        .post(
            "/api/products",
            json!({ "name": "Other", "sku": "dup-1", "category": "Misc", "priceCents": 1 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.json()["code"], "CONFLICT");
}

#[tokio::test]
async fn test_missing_name_is_validation_error() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/products",
            json!({ "sku": "X-1", "category": "Misc", "priceCents": 1 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_and_delete_missing_product() {
    let app = TestApp::new().await;

    let res = app
        .put(
            "/api/products/missing",
            json!({ "name": "A", "sku": "A-1", "category": "Misc", "priceCents": 1 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.delete("/api/products/missing").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_stats_route() {
    let app = TestApp::new().await;
    app.create_product("A-1", 1000, 5).await;
    app.create_product("B-1", 200, 50).await;

    let res = app.get("/api/products/stats/dashboard").await;
    assert_eq!(res.status, StatusCode::OK);
    let stats = res.json();
    assert_eq!(stats["totalProducts"], 2);
    assert_eq!(stats["lowStockProducts"], 1);
    assert_eq!(stats["stockValueCents"], 5 * 1000 + 50 * 200);
    assert_eq!(stats["totalCategories"], 1);
}

#[tokio::test]
async fn test_customer_crud_and_validation() {
    let app = TestApp::new().await;

    let res = app
        .post("/api/customers", json!({ "name": "Ada", "email": "ada@example.com" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["message"], "Name, email, and phone are required");

    let id = app.create_customer("Ada@Example.com").await;

    let res = app.get(&format!("/api/customers/{id}")).await;
    let customer = res.json();
    assert_eq!(customer["email"], "ada@example.com");
    assert_eq!(customer["totalSpentCents"], 0);
    assert_eq!(customer["loyaltyPoints"], 0);

    let res = app
        .post(
            "/api/customers",
            json!({ "name": "Ada 2", "email": "ada@example.com", "phone": "1" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .put(
            &format!("/api/customers/{id}"),
            json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "phone": "555-0199",
                "address": { "city": "London" }
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["address"]["city"], "London");

    let res = app.get("/api/customers/stats/dashboard").await;
    assert_eq!(res.json()["totalCustomers"], 1);
    assert_eq!(res.json()["newCustomers"], 1);

    let res = app.delete(&format!("/api/customers/{id}")).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.delete(&format!("/api/customers/{id}")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_body_rejections_use_error_contract() {
    let app = TestApp::new().await;

    let res = app.request(Method::POST, "/api/products", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "VALIDATION_ERROR");

    let res = app.post("/api/products", json!({ "name": "Mouse", "priceCents": "cheap" })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "VALIDATION_ERROR");
}
