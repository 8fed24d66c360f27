//! API routes

mod auth;
mod files;
mod health;
mod types;
mod users;

use axum::{Router, extract::DefaultBodyLimit};

use crate::state::AppState;

/// Maximum upload size (512 MB)
const MAX_UPLOAD_SIZE: usize = 512 * 1024 * 1024;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .merge(health::routes())
        // Auth + session lifecycle
        .merge(auth::routes())
        // Admin user management
        .merge(users::routes())
        // Scoped file operations
        .merge(files::routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}
