//! Shared router state.

use std::sync::Arc;

use smartstock_db::Database;

use crate::auth::JwtManager;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
        }
    }
}
