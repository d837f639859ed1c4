//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::ResultStore;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Currently loaded results
    pub store: Arc<ResultStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new application state with an empty store.
    pub fn new(config: AppConfig) -> Self {
        Self::with_store(Arc::new(ResultStore::new()), config)
    }

    pub fn with_store(store: Arc<ResultStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
