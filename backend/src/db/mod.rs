//! Database module for feed storage.
//!
//! Storage is reached only through the [`FeedRepository`] trait. A repository
//! is built once at startup by the [`factory`] and passed explicitly to the
//! HTTP layer; there is no process-wide instance.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers (decode, validate, classify errors)      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │  Arc<dyn FeedRepository>
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository trait (repository.rs) - Abstract Interface  │
//! └───────────────────┬─────────────────────────────────────┘
//!          ┌──────────┴───────────┐
//!   LocalRepository        PostgresRepository
//!     (in-memory)          (Diesel + r2d2)
//! ```

// Feature flag priority: postgres > local
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod config;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use config::PostgresConfig;
pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::{PoolStats, PostgresRepository};
pub use repository::{
    ensure_valid_id, ErrorContext, FeedRepository, RepositoryError, RepositoryResult,
};
