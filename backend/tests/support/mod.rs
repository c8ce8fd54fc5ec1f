#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
#[cfg(feature = "local-repo")]
use rss_feeds::db::LocalRepository;
use rss_feeds::db::{FeedRepository, RepositoryError, RepositoryResult};
use rss_feeds::models::{Feed, ListOptions};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn sample_feed(title: &str) -> Feed {
    let slug = title.to_lowercase().replace(' ', "-");
    Feed::new(
        title,
        format!("Posts about {}", title),
        format!("https://{}.example.com/feed.xml", slug),
        format!("https://{}.example.com", slug),
    )
}

/// Insert a feed and return it with its assigned identity.
#[cfg(feature = "local-repo")]
pub async fn seed(repo: &LocalRepository, title: &str) -> Feed {
    let mut feed = sample_feed(title);
    repo.create(&mut feed).await.unwrap();
    feed
}

/// Repository whose every call fails the same way.
pub struct FailingRepository {
    error: fn() -> RepositoryError,
}

impl FailingRepository {
    pub fn storage() -> Self {
        Self {
            error: || RepositoryError::storage("connection refused on 10.0.0.5:5432"),
        }
    }

    pub fn conflict() -> Self {
        Self {
            error: || RepositoryError::edit_conflict("stale version"),
        }
    }
}

#[async_trait]
impl FeedRepository for FailingRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(false)
    }

    async fn create(&self, _feed: &mut Feed) -> RepositoryResult<()> {
        Err((self.error)())
    }

    async fn get(&self, id: i64) -> RepositoryResult<Feed> {
        // Lets update handlers reach the write.
        let mut feed = sample_feed("Existing");
        feed.id = id;
        feed.version = 1;
        if id == 1 {
            return Ok(feed);
        }
        Err((self.error)())
    }

    async fn list(
        &self,
        _title: &str,
        _url: &str,
        _options: &ListOptions,
    ) -> RepositoryResult<Vec<Feed>> {
        Err((self.error)())
    }

    async fn update(&self, _feed: &mut Feed) -> RepositoryResult<()> {
        Err((self.error)())
    }

    async fn delete(&self, _id: i64) -> RepositoryResult<()> {
        Err((self.error)())
    }
}

#[cfg(feature = "local-repo")]
pub fn local_repo() -> Arc<LocalRepository> {
    Arc::new(LocalRepository::new())
}
