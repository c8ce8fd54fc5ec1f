//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Per-call timeouts, enforced both client-side (tokio) and server-side
//!   (`statement_timeout` set on every pooled connection)
//! - Optimistic concurrency on update via a `version` compare-and-swap
//! - Automatic migration execution
//!
//! Diesel is synchronous, so every call runs on the blocking thread pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, info};

use crate::db::config::PostgresConfig;
use crate::db::repository::{
    ensure_valid_id, ErrorContext, FeedRepository, RepositoryError, RepositoryResult,
};
use crate::models::{Feed, ListOptions, SortColumn, SortDirection};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total queries that reached the database
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
}

/// Sets `statement_timeout` on each connection the pool opens, so the server
/// cancels a query the client has already given up on.
#[derive(Debug, Clone, Copy)]
struct StatementTimeout(Duration);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for StatementTimeout {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        sql_query(format!("SET statement_timeout = {}", self.0.as_millis()))
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// Blocks until the pool holds its idle connections or
    /// `connection_timeout_sec` elapses.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.effective_min_idle()))
            .connection_timeout(config.connection_timeout())
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .connection_customizer(Box::new(StatementTimeout(config.query_timeout())))
            .build(manager)
            .map_err(|e| {
                RepositoryError::storage_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::storage_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Build the pool off the async runtime and verify connectivity, all
    /// within the configured connection timeout.
    pub async fn connect(config: PostgresConfig) -> RepositoryResult<Self> {
        let limit = config.connection_timeout();
        let started = Instant::now();

        let repo = task::spawn_blocking(move || Self::new(config))
            .await
            .map_err(|e| {
                RepositoryError::storage_with_context(
                    format!("Task join error: {}", e),
                    ErrorContext::new("spawn_blocking"),
                )
            })??;

        match tokio::time::timeout(limit, repo.ping()).await {
            Ok(result) => result?,
            Err(_) => return Err(RepositoryError::timeout("ping", limit)),
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            max_pool_size = repo.config.max_pool_size,
            "database connection pool established"
        );
        Ok(repo)
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::storage_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.with_conn("ping", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await
    }

    /// Run `f` on a pooled connection, bounded by the query timeout.
    ///
    /// No retries: a failure is reported to the caller as-is.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let total_queries = self.total_queries.clone();
        let limit = self.config.query_timeout();

        let work = task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::storage_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection").with_details("pool_error"),
                )
            })?;
            total_queries.fetch_add(1, Ordering::Relaxed);
            f(&mut conn)
        });

        let result = match tokio::time::timeout(limit, work).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(RepositoryError::storage_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )),
            Err(_) => Err(RepositoryError::timeout(operation, limit)),
        };

        if result.is_err() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }
        result.map_err(|e| e.with_operation(operation))
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

/// `%needle%` with LIKE metacharacters escaped so they match literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl FeedRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.ping().await.map(|_| true)
    }

    async fn create(&self, feed: &mut Feed) -> RepositoryResult<()> {
        let row = NewFeedRow::from(&*feed);

        let (id, created_at, version) = self
            .with_conn("create", move |conn| {
                diesel::insert_into(feeds::table)
                    .values(&row)
                    .returning((feeds::id, feeds::created_at, feeds::version))
                    .get_result::<(i64, DateTime<Utc>, i32)>(conn)
                    .map_err(map_diesel_error)
            })
            .await?;

        feed.id = id;
        feed.created_at = created_at;
        feed.version = version;
        debug!(feed_id = id, "feed created");
        Ok(())
    }

    async fn get(&self, id: i64) -> RepositoryResult<Feed> {
        ensure_valid_id(id, "get")?;

        self.with_conn("get", move |conn| {
            feeds::table
                .filter(feeds::id.eq(id))
                .select(FeedRow::as_select())
                .first::<FeedRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Feed::from)
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        "Record not found",
                        ErrorContext::new("get").with_entity("feed").with_entity_id(id),
                    )
                })
        })
        .await
    }

    async fn list(
        &self,
        title: &str,
        url: &str,
        options: &ListOptions,
    ) -> RepositoryResult<Vec<Feed>> {
        let title = title.to_string();
        let url = url.to_string();
        let (column, direction) = options.sort_key();
        let limit = options.limit();
        let offset = options.offset();

        self.with_conn("list", move |conn| {
            let mut query = feeds::table.select(FeedRow::as_select()).into_boxed();

            if !title.is_empty() {
                query = query.filter(feeds::title.ilike(like_pattern(&title)));
            }
            if !url.is_empty() {
                query = query.filter(feeds::url.ilike(like_pattern(&url)));
            }

            query = match (column, direction) {
                (SortColumn::Id, SortDirection::Ascending) => query.order(feeds::id.asc()),
                (SortColumn::Id, SortDirection::Descending) => query.order(feeds::id.desc()),
                (SortColumn::Title, SortDirection::Ascending) => query.order(feeds::title.asc()),
                (SortColumn::Title, SortDirection::Descending) => query.order(feeds::title.desc()),
                (SortColumn::Url, SortDirection::Ascending) => query.order(feeds::url.asc()),
                (SortColumn::Url, SortDirection::Descending) => query.order(feeds::url.desc()),
                (SortColumn::SiteUrl, SortDirection::Ascending) => {
                    query.order(feeds::site_url.asc())
                }
                (SortColumn::SiteUrl, SortDirection::Descending) => {
                    query.order(feeds::site_url.desc())
                }
            };

            let rows = query
                .then_order_by(feeds::id.asc())
                .limit(limit)
                .offset(offset)
                .load::<FeedRow>(conn)
                .map_err(map_diesel_error)?;

            Ok(rows.into_iter().map(Feed::from).collect())
        })
        .await
    }

    async fn update(&self, feed: &mut Feed) -> RepositoryResult<()> {
        ensure_valid_id(feed.id, "update")?;

        let id = feed.id;
        let expected_version = feed.version;
        let changes = FeedChangeset::from(&*feed);

        let new_version = self
            .with_conn("update", move |conn| {
                diesel::update(
                    feeds::table
                        .filter(feeds::id.eq(id))
                        .filter(feeds::version.eq(expected_version)),
                )
                .set((changes, feeds::version.eq(feeds::version + 1)))
                .returning(feeds::version)
                .get_result::<i32>(conn)
                .optional()
                .map_err(map_diesel_error)?
                // Zero rows: either deleted or modified since the caller read it.
                .ok_or_else(|| {
                    RepositoryError::edit_conflict_with_context(
                        "edit conflict",
                        ErrorContext::new("update")
                            .with_entity("feed")
                            .with_entity_id(id)
                            .with_details(format!("expected_version={}", expected_version)),
                    )
                })
            })
            .await?;

        feed.version = new_version;
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        ensure_valid_id(id, "delete")?;

        self.with_conn("delete", move |conn| {
            let affected = diesel::delete(feeds::table.filter(feeds::id.eq(id)))
                .execute(conn)
                .map_err(map_diesel_error)?;

            if affected == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "Record not found",
                    ErrorContext::new("delete").with_entity("feed").with_entity_id(id),
                ));
            }
            Ok(())
        })
        .await
    }
}
