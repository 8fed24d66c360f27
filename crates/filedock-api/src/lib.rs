//! Filedock REST API
//!
//! This crate provides the Axum-based HTTP API for Filedock: session
//! lifecycle endpoints, admin user management, and scoped file
//! operations over the object store.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
