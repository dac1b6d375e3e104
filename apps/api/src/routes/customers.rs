//! `/api/customers`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use smartstock_core::{Customer, CustomerInput};
use smartstock_db::CustomerStats;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/stats/dashboard", get(dashboard_stats))
        .route(
            "/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

/// Name, email and phone are checked together so the client gets one message.
fn require_contact(input: &CustomerInput) -> ApiResult<()> {
    let blank = |s: &str| s.trim().is_empty();
    if blank(&input.name) || blank(&input.email) || blank(&input.phone) {
        return Err(ApiError::validation("Name, email, and phone are required"));
    }
    Ok(())
}

async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list().await?))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().get(&id).await?))
}

async fn create_customer(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    require_contact(&input)?;
    let customer = state.db.customers().create(input).await?;
    info!(customer_id = %customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<Json<Customer>> {
    require_contact(&input)?;
    Ok(Json(state.db.customers().update(&id, input).await?))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.customers().delete(&id).await?;
    info!(customer_id = %id, "Customer deleted");
    Ok(Json(json!({ "message": "Customer deleted successfully" })))
}

async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<Json<CustomerStats>> {
    Ok(Json(state.db.customers().dashboard_stats().await?))
}
