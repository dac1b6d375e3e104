//! HTTP routes, one module per resource.

mod auth;
mod customers;
mod products;
mod reports;
mod sales;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// All routes, without middleware.
pub fn router() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth::auth_routes())
        .nest("/products", products::product_routes())
        .nest("/customers", customers::customer_routes())
        .nest("/sales", sales::sale_routes())
        .nest("/reports", reports::report_routes());

    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .nest("/api", api)
}

async fn banner() -> Json<Value> {
    Json(json!({ "message": "SmartStock Inventory Management API" }))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "unavailable" })),
        )
    }
}
