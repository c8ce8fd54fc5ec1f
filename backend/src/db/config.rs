//! Database connection and pool configuration.

use std::time::Duration;

/// Default bound on a single row operation.
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 3_000;
/// Default bound on establishing connectivity at startup.
pub const DEFAULT_CONNECT_TIMEOUT_SEC: u64 = 5;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Number of idle connections the pool tries to keep open
    pub min_idle: u32,
    /// Connection timeout in seconds, also the bound on the startup ping
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Per-call timeout for row operations, in milliseconds
    pub query_timeout_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 25,
            min_idle: 25,
            connection_timeout_sec: DEFAULT_CONNECT_TIMEOUT_SEC,
            idle_timeout_sec: 15 * 60,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
        }
    }
}

impl PostgresConfig {
    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_sec)
    }

    /// Idle connections actually requested from the pool; never above the pool size.
    pub fn effective_min_idle(&self) -> u32 {
        self.min_idle.min(self.max_pool_size)
    }
}
