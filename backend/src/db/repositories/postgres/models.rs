use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::feeds;
use crate::models::Feed;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = feeds)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FeedRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub site_url: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            title: row.title,
            description: row.description,
            url: row.url,
            site_url: row.site_url,
            language: row.language,
            created_at: row.created_at,
            version: row.version,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feeds)]
pub struct NewFeedRow {
    pub title: String,
    pub description: String,
    pub url: String,
    pub site_url: String,
    pub language: String,
}

impl From<&Feed> for NewFeedRow {
    fn from(feed: &Feed) -> Self {
        Self {
            title: feed.title.clone(),
            description: feed.description.clone(),
            url: feed.url.clone(),
            site_url: feed.site_url.clone(),
            language: feed.language.clone(),
        }
    }
}

/// Mutable columns written by the conditional update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = feeds)]
pub struct FeedChangeset {
    pub title: String,
    pub description: String,
    pub url: String,
    pub site_url: String,
    pub language: String,
}

impl From<&Feed> for FeedChangeset {
    fn from(feed: &Feed) -> Self {
        Self {
            title: feed.title.clone(),
            description: feed.description.clone(),
            url: feed.url.clone(),
            site_url: feed.site_url.clone(),
            language: feed.language.clone(),
        }
    }
}
