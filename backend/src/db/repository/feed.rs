//! Feed repository trait: the data access capability handed to the HTTP layer.

use async_trait::async_trait;

use super::error::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{Feed, ListOptions};

/// Repository trait for feed persistence.
///
/// Every implementation must honour the same contract:
/// - ids below 1 are rejected with `InvalidArgument` before any store access;
/// - `update` is a compare-and-swap on `version` and reports a mismatch as
///   `EditConflict`, never `NotFound`;
/// - every store call is bounded by a timeout, and exceeding it is a
///   `StorageFailure`.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert a new feed.
    ///
    /// On success the store-assigned `id`, `created_at` and `version` (always 1)
    /// are written back into `feed`.
    async fn create(&self, feed: &mut Feed) -> RepositoryResult<()>;

    /// Fetch one feed by id, including its current version.
    ///
    /// # Returns
    /// * `Err(RepositoryError::InvalidArgument)` - If `id < 1`
    /// * `Err(RepositoryError::NotFound)` - If no row has this id
    async fn get(&self, id: i64) -> RepositoryResult<Feed>;

    /// List feeds whose title and url contain the given filters
    /// (case-insensitive; empty matches all), sorted and paged by `options`.
    ///
    /// Ties in the sort column are ordered by id ascending. No match yields an
    /// empty vector.
    async fn list(&self, title: &str, url: &str, options: &ListOptions)
        -> RepositoryResult<Vec<Feed>>;

    /// Overwrite the mutable fields of `feed` if its `version` still matches
    /// the stored one, bumping the version by one.
    ///
    /// On success the new version is written back into `feed`.
    ///
    /// # Returns
    /// * `Err(RepositoryError::InvalidArgument)` - If `feed.id < 1`
    /// * `Err(RepositoryError::EditConflict)` - If no row matched id and version
    async fn update(&self, feed: &mut Feed) -> RepositoryResult<()>;

    /// Hard-delete a feed.
    ///
    /// # Returns
    /// * `Err(RepositoryError::InvalidArgument)` - If `id < 1`
    /// * `Err(RepositoryError::NotFound)` - If no row was deleted
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
}

/// Reject identifiers that can never name a stored row.
pub fn ensure_valid_id(id: i64, operation: &str) -> RepositoryResult<()> {
    if id < 1 {
        return Err(RepositoryError::invalid_argument_with_context(
            "id must be a positive integer",
            ErrorContext::new(operation)
                .with_entity("feed")
                .with_entity_id(id),
        ));
    }
    Ok(())
}
