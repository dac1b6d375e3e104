//! Test harness: the full router over an in-memory database.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use smartstock_api::auth::JwtManager;
use smartstock_api::{app, AppState};
use smartstock_db::{Database, DbConfig};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret";

pub struct TestApp {
    router: Router,
    pub db: Database,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response body is not UTF-8")
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory())
            .await
            .expect("failed to create test database");
        let jwt = JwtManager::new(TEST_SECRET.to_string(), 3600);
        let router = app(AppState::new(db.clone(), jwt));
        TestApp { router, db }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body")
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Creates a product and returns its id.
    pub async fn create_product(&self, sku: &str, price_cents: i64, stock: i64) -> String {
        let res = self
            .post(
                "/api/products",
                json!({
                    "name": format!("Product {sku}"),
                    "sku": sku,
                    "category": "Electronics",
                    "priceCents": price_cents,
                    "stock": stock,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());
        res.json()["id"].as_str().unwrap().to_string()
    }

    /// Creates a customer and returns its id.
    pub async fn create_customer(&self, email: &str) -> String {
        let res = self
            .post(
                "/api/customers",
                json!({ "name": "Ada", "email": email, "phone": "555-0100" }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());
        res.json()["id"].as_str().unwrap().to_string()
    }
}
