//! The Feed entity, its business rules and the listing options.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::validator::{permitted_value, Validator};

/// Maximum title length, in bytes.
pub const MAX_TITLE_BYTES: usize = 500;

/// RSS feed metadata.
///
/// `created_at` and `version` are store-managed and never serialized.
/// `version` is the optimistic-concurrency token: it starts at 1 and grows by
/// exactly one on every successful update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Feed {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub site_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: i32,
}

impl Feed {
    /// Build an unsaved feed. The store assigns `id`, `created_at` and `version`.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            url: url.into(),
            site_url: site_url.into(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Apply the feed rules to `feed`, in order.
pub fn validate_feed(v: &mut Validator, feed: &Feed) {
    v.check(!feed.title.is_empty(), "title", "must be provided");
    v.check(
        feed.title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );
    v.check(!feed.description.is_empty(), "description", "must be provided");
    v.check(!feed.url.is_empty(), "url", "must be provided");
    v.check(!feed.site_url.is_empty(), "site_url", "must be provided");
}

// =============================================================================
// Listing
// =============================================================================

pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Sort keys accepted by [`ListOptions::sort`]. A leading `-` sorts descending.
pub const SORT_SAFELIST: [&str; 8] = [
    "id", "title", "url", "site_url", "-id", "-title", "-url", "-site_url",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Title,
    Url,
    SiteUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Paging and sorting for `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: "id".to_string(),
        }
    }
}

impl ListOptions {
    /// Column and direction for `sort`. Unknown keys fall back to `id` ascending;
    /// callers are expected to have validated the options first.
    pub fn sort_key(&self) -> (SortColumn, SortDirection) {
        let (name, direction) = match self.sort.strip_prefix('-') {
            Some(name) => (name, SortDirection::Descending),
            None => (self.sort.as_str(), SortDirection::Ascending),
        };
        let column = match name {
            "title" => SortColumn::Title,
            "url" => SortColumn::Url,
            "site_url" => SortColumn::SiteUrl,
            _ => SortColumn::Id,
        };
        (column, direction)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

pub fn validate_list_options(v: &mut Validator, options: &ListOptions) {
    v.check(options.page > 0, "page", "must be greater than zero");
    v.check(options.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
    v.check(options.page_size > 0, "page_size", "must be greater than zero");
    v.check(
        options.page_size <= MAX_PAGE_SIZE,
        "page_size",
        "must be a maximum of 100",
    );
    v.check(
        permitted_value(&options.sort.as_str(), &SORT_SAFELIST),
        "sort",
        "invalid sort value",
    );
}

/// Case-insensitive substring match used by the in-memory store; an empty
/// needle matches everything.
pub fn matches_filter(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
