//! # SmartStock API
//!
//! REST server for inventory, customers, point-of-sale and reporting.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SmartStock API                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/products │  │  /api/sales    │  │  /api/reports              ││
//! │  │  /api/customers│  │                │  │                            ││
//! │  │                │  │ • list / get   │  │ • sales-trend, categories  ││
//! │  │ • CRUD         │  │ • commit sale  │  │ • top products, health     ││
//! │  │ • dashboard    │  │   (one tx)     │  │ • CSV export               ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌──────────────────────────────────────────────┐  │
//! │  │  /api/auth     │  │  smartstock-db (SQLite pool, repositories)   │  │
//! │  │ signup / login │  └──────────────────────────────────────────────┘  │
//! │  └────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (or `smartstock.toml`):
//! - `HOST` - bind address (default: 0.0.0.0)
//! - `PORT` - bind port (default: 8000)
//! - `DATABASE_PATH` - SQLite file (default: smartstock.db)
//! - `DATABASE_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - secret for token signing (required)
//! - `JWT_LIFETIME_SECS` - token lifetime (default: 86400)

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the application router with request tracing and permissive CORS.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
