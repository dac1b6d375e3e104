//! `/api/sales`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use smartstock_core::{PopulatedSale, SaleRequest};

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/{id}", get(get_sale))
}

async fn list_sales(State(state): State<AppState>) -> ApiResult<Json<Vec<PopulatedSale>>> {
    Ok(Json(state.db.sales().list_populated().await?))
}

async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PopulatedSale>> {
    Ok(Json(state.db.sales().get_populated(&id).await?))
}

/// Commits a sale: validates, prices, decrements stock, numbers it and
/// credits the customer in one transaction.
async fn create_sale(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaleRequest>,
) -> ApiResult<(StatusCode, Json<PopulatedSale>)> {
    let sale = state.db.sales().create_sale(request).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
