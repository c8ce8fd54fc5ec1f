//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::Environment;
use crate::db::FeedRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FeedRepository>,
    /// Reported by the health check
    pub environment: Environment,
    pub version: String,
}

impl AppState {
    /// Create a new application state with the given repository.
    pub fn new(repository: Arc<dyn FeedRepository>, environment: Environment) -> Self {
        Self {
            repository,
            environment,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}
