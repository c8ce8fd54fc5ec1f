//! In-memory repository for unit testing and local development.
//!
//! Mirrors the Postgres semantics exactly: store-assigned ids starting at 1,
//! `version` starting at 1 and bumped on update, compare-and-swap updates and
//! affected-row based deletes. All state sits behind a single lock, so each
//! operation is atomic with respect to the others.

use std::collections::BTreeMap;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::db::repository::{
    ensure_valid_id, ErrorContext, FeedRepository, RepositoryError, RepositoryResult,
};
use crate::models::{matches_filter, Feed, ListOptions, SortColumn, SortDirection};

#[derive(Debug, Default)]
struct LocalState {
    feeds: BTreeMap<i64, Feed>,
    next_id: i64,
}

/// In-memory feed store.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    state: Arc<RwLock<LocalState>>,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations that reached the store.
    pub fn total_queries(&self) -> u64 {
        self.total_queries.load(Ordering::Relaxed)
    }

    /// Number of operations that reached the store and failed.
    pub fn failed_queries(&self) -> u64 {
        self.failed_queries.load(Ordering::Relaxed)
    }

    /// Number of stored feeds.
    pub fn len(&self) -> usize {
        self.state.read().feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record<T>(&self, result: RepositoryResult<T>) -> RepositoryResult<T> {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        if result.is_err() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}

fn compare_feeds(a: &Feed, b: &Feed, column: SortColumn, direction: SortDirection) -> CmpOrdering {
    let primary = match column {
        SortColumn::Id => a.id.cmp(&b.id),
        SortColumn::Title => a.title.cmp(&b.title),
        SortColumn::Url => a.url.cmp(&b.url),
        SortColumn::SiteUrl => a.site_url.cmp(&b.site_url),
    };
    let primary = match direction {
        SortDirection::Ascending => primary,
        SortDirection::Descending => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl FeedRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn create(&self, feed: &mut Feed) -> RepositoryResult<()> {
        let mut state = self.state.write();
        state.next_id += 1;

        feed.id = state.next_id;
        feed.created_at = Utc::now();
        feed.version = 1;
        state.feeds.insert(feed.id, feed.clone());

        self.record(Ok(()))
    }

    async fn get(&self, id: i64) -> RepositoryResult<Feed> {
        ensure_valid_id(id, "get")?;

        let found = self.state.read().feeds.get(&id).cloned();
        self.record(found.ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Record not found",
                ErrorContext::new("get").with_entity("feed").with_entity_id(id),
            )
        }))
    }

    async fn list(
        &self,
        title: &str,
        url: &str,
        options: &ListOptions,
    ) -> RepositoryResult<Vec<Feed>> {
        let (column, direction) = options.sort_key();

        let mut feeds: Vec<Feed> = self
            .state
            .read()
            .feeds
            .values()
            .filter(|feed| matches_filter(&feed.title, title) && matches_filter(&feed.url, url))
            .cloned()
            .collect();
        feeds.sort_by(|a, b| compare_feeds(a, b, column, direction));

        let page = feeds
            .into_iter()
            .skip(options.offset().max(0) as usize)
            .take(options.limit().max(0) as usize)
            .collect();

        self.record(Ok(page))
    }

    async fn update(&self, feed: &mut Feed) -> RepositoryResult<()> {
        ensure_valid_id(feed.id, "update")?;

        let mut state = self.state.write();
        let result = match state.feeds.get_mut(&feed.id) {
            Some(stored) if stored.version == feed.version => {
                stored.title = feed.title.clone();
                stored.description = feed.description.clone();
                stored.url = feed.url.clone();
                stored.site_url = feed.site_url.clone();
                stored.language = feed.language.clone();
                stored.version += 1;
                feed.version = stored.version;
                Ok(())
            }
            _ => Err(RepositoryError::edit_conflict_with_context(
                "edit conflict",
                ErrorContext::new("update")
                    .with_entity("feed")
                    .with_entity_id(feed.id)
                    .with_details(format!("expected_version={}", feed.version)),
            )),
        };

        self.record(result)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        ensure_valid_id(id, "delete")?;

        let removed = self.state.write().feeds.remove(&id);
        self.record(match removed {
            Some(_) => Ok(()),
            None => Err(RepositoryError::not_found_with_context(
                "Record not found",
                ErrorContext::new("delete").with_entity("feed").with_entity_id(id),
            )),
        })
    }
}
