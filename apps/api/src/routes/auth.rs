//! `/api/auth`

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use smartstock_core::{User, UserProfile};
use smartstock_db::DbError;
use tracing::info;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

impl AuthResponse {
    fn for_user(state: &AppState, user: &User) -> ApiResult<Self> {
        Ok(AuthResponse {
            user: user.profile(),
            token: state.jwt.issue(&user.id, &user.email)?,
        })
    }
}

async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Name, email, and password are required"));
    }

    let users = state.db.users();
    if users.find_by_email(&req.email).await?.is_some() {
        return Err(ApiError::validation("User already exists with this email"));
    }

    let hash = hash_password(&req.password)?;
    let user = users
        .create(&req.name, &req.email, &hash)
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent signup for the same email.
            DbError::UniqueViolation { .. } => {
                ApiError::validation("User already exists with this email")
            }
            other => ApiError::from(other),
        })?;

    info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(AuthResponse::for_user(&state, &user)?)))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state
        .db
        .users()
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    info!(user_id = %user.id, "User logged in");
    Ok(Json(AuthResponse::for_user(&state, &user)?))
}
