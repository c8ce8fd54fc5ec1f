//! Data Transfer Objects for the HTTP API.
//!
//! Every response is a single JSON object keyed by what it carries (`feed`,
//! `feeds`, `message`, `error`, `status`). Request bodies reject unknown keys.

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Feed;
use crate::validator::ValidationErrors;

/// `{"feed": {...}}`
#[derive(Debug, Clone, Serialize)]
pub struct FeedEnvelope {
    pub feed: Feed,
}

/// `{"feeds": [...]}`
#[derive(Debug, Clone, Serialize)]
pub struct FeedsEnvelope {
    pub feeds: Vec<Feed>,
}

/// `{"message": "..."}`
#[derive(Debug, Clone, Serialize)]
pub struct MessageEnvelope {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub system_info: SystemInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub environment: String,
    pub version: String,
}

/// `{"error": ...}` where the payload is either a message or a field map.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Message(String),
    Fields(ValidationErrors),
}

/// Request body for creating a feed. Missing or `null` fields decode as empty
/// strings and are then caught by validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateFeedRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub site_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub language: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CreateFeedRequest {
    pub fn into_feed(self) -> Feed {
        Feed::new(self.title, self.description, self.url, self.site_url).with_language(self.language)
    }
}

/// A field of a partial update.
///
/// `Absent` means the key was not in the body (or was `null`) and the stored
/// value is kept. `Present` carries the new value, which may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Present(T),
}

impl<T> Patch<T> {
    /// Overwrite `target` when a value is present.
    pub fn apply(self, target: &mut T) {
        if let Patch::Present(value) = self {
            *target = value;
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Patch::Present(_))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Present(value),
            None => Patch::Absent,
        })
    }
}

/// Request body for a partial feed update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateFeedRequest {
    pub title: Patch<String>,
    pub description: Patch<String>,
    pub url: Patch<String>,
    pub site_url: Patch<String>,
    pub language: Patch<String>,
}

impl UpdateFeedRequest {
    /// Overlay the present fields onto `feed`. `id` and `version` are untouched.
    pub fn apply_to(self, feed: &mut Feed) {
        self.title.apply(&mut feed.title);
        self.description.apply(&mut feed.description);
        self.url.apply(&mut feed.url);
        self.site_url.apply(&mut feed.site_url);
        self.language.apply(&mut feed.language);
    }
}
