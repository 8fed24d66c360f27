//! Application state

use std::sync::Arc;

use filedock_auth::{AuthGuard, SessionManager};
use filedock_db::Database;
use filedock_storage::FileStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub store: FileStore,
    pub sessions: SessionManager,
    pub guard: AuthGuard,
    /// Named path prefixes offered in the admin panel when assigning
    /// restrictions
    pub named_prefixes: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(
        db: Database,
        store: FileStore,
        sessions: SessionManager,
        guard: AuthGuard,
        named_prefixes: Vec<String>,
    ) -> Self {
        Self {
            db,
            store,
            sessions,
            guard,
            named_prefixes: Arc::new(named_prefixes),
        }
    }
}
