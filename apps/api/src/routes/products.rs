//! `/api/products`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use smartstock_core::{Product, ProductInput};
use smartstock_db::ProductStats;
use tracing::info;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/stats/dashboard", get(dashboard_stats))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().get(&id).await?))
}

async fn create_product(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.db.products().create(input).await?;
    info!(product_id = %product.id, sku = %product.sku, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().update(&id, input).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.products().delete(&id).await?;
    info!(product_id = %id, "Product deleted");
    Ok(Json(json!({ "message": "Product deleted" })))
}

async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<Json<ProductStats>> {
    Ok(Json(state.db.products().dashboard_stats().await?))
}
