//! `/api/reports`

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use smartstock_db::{CustomerInsights, InventoryHealth, Series, TopProduct};

use crate::error::{ApiError, ApiResult};
use crate::export::to_csv;
use crate::state::AppState;

const DEFAULT_TREND_DAYS: u32 = 7;
const DEFAULT_TOP_PRODUCTS: u32 = 10;

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/sales-trend", get(sales_trend))
        .route("/sales-by-category", get(sales_by_category))
        .route("/top-products", get(top_products))
        .route("/top-products/{limit}", get(top_products_limited))
        .route("/inventory-health", get(inventory_health))
        .route("/customer-insights", get(customer_insights))
        .route("/export/{type}", get(export))
}

#[derive(Debug, Deserialize)]
struct TrendParams {
    days: Option<u32>,
}

async fn sales_trend(
    State(state): State<AppState>,
    Query(params): Query<TrendParams>,
) -> ApiResult<Json<Series>> {
    let days = params.days.unwrap_or(DEFAULT_TREND_DAYS);
    Ok(Json(state.db.reports().sales_trend(days).await?))
}

async fn sales_by_category(State(state): State<AppState>) -> ApiResult<Json<Series>> {
    Ok(Json(state.db.reports().sales_by_category().await?))
}

async fn top_products(State(state): State<AppState>) -> ApiResult<Json<Vec<TopProduct>>> {
    Ok(Json(
        state.db.reports().top_products(DEFAULT_TOP_PRODUCTS).await?,
    ))
}

async fn top_products_limited(
    State(state): State<AppState>,
    Path(limit): Path<u32>,
) -> ApiResult<Json<Vec<TopProduct>>> {
    Ok(Json(state.db.reports().top_products(limit).await?))
}

async fn inventory_health(State(state): State<AppState>) -> ApiResult<Json<InventoryHealth>> {
    Ok(Json(state.db.reports().inventory_health().await?))
}

async fn customer_insights(State(state): State<AppState>) -> ApiResult<Json<CustomerInsights>> {
    Ok(Json(state.db.reports().customer_insights().await?))
}

async fn export(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Response> {
    let body = match kind.as_str() {
        "products" => to_csv(&state.db.products().list().await?),
        "customers" => to_csv(&state.db.customers().list().await?),
        "sales" => to_csv(&state.db.sales().list_populated().await?),
        _ => return Err(ApiError::validation("Invalid export type")),
    }
    .map_err(|e| {
        tracing::error!("Failed to render {} export: {}", kind, e);
        ApiError::internal("Failed to render export")
    })?;

    let disposition = format!("attachment; filename={}-export.csv", kind);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
