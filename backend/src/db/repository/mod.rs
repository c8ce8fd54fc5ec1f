//! Repository trait definitions for database operations.
//!
//! - [`error`]: Error types for repository operations
//! - [`feed`]: CRUD operations for feeds

pub mod error;
pub mod feed;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use feed::{ensure_valid_id, FeedRepository};
