//! HTTP handlers for the REST API.
//!
//! Every feed handler follows the same pipeline: decode, validate, call the
//! repository, then write either the success envelope or let [`AppError`]
//! classify the failure.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use super::dto::{
    CreateFeedRequest, FeedEnvelope, FeedsEnvelope, HealthResponse, MessageEnvelope, SystemInfo,
    UpdateFeedRequest,
};
use super::error::{error_response, method_not_allowed_response, AppError, NOT_FOUND_MESSAGE};
use super::request::{read_json, read_list_query, FeedId};
use super::state::AppState;
use crate::models::validate_feed;
use crate::validator::Validator;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /v1/healthcheck
pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "available".to_string(),
        system_info: SystemInfo {
            environment: state.environment.to_string(),
            version: state.version.clone(),
        },
    })
}

// =============================================================================
// Feed CRUD
// =============================================================================

/// POST /v1/admin/feeds
///
/// Responds 201 with a `Location` header pointing at the new feed.
pub async fn create_feed(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let input: CreateFeedRequest = read_json(body)?;
    let mut feed = input.into_feed();

    let mut v = Validator::new();
    validate_feed(&mut v, &feed);
    if !v.valid() {
        return Err(AppError::ValidationFailed(v.into_errors()));
    }

    state.repository.create(&mut feed).await?;
    info!(feed_id = feed.id, "feed created");

    let location = format!("/v1/feeds/{}", feed.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(FeedEnvelope { feed }),
    )
        .into_response())
}

/// GET /v1/feeds/{id}
pub async fn show_feed(
    State(state): State<AppState>,
    FeedId(id): FeedId,
) -> HandlerResult<FeedEnvelope> {
    let feed = state.repository.get(id).await?;
    Ok(Json(FeedEnvelope { feed }))
}

/// GET /v1/feeds
///
/// Optional `title` and `url` substring filters, `page`, `page_size` and `sort`.
pub async fn list_feeds(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult<FeedsEnvelope> {
    let query = read_list_query(&params)?;
    let feeds = state
        .repository
        .list(&query.title, &query.url, &query.options)
        .await?;
    debug!(count = feeds.len(), page = query.options.page, "listed feeds");
    Ok(Json(FeedsEnvelope { feeds }))
}

/// PATCH /v1/feeds/{id}
///
/// Fields absent from the body keep their stored values. The write is a
/// compare-and-swap on the version read here, so a concurrent edit yields 409.
pub async fn update_feed(
    State(state): State<AppState>,
    FeedId(id): FeedId,
    body: Result<Bytes, BytesRejection>,
) -> HandlerResult<FeedEnvelope> {
    let mut feed = state.repository.get(id).await?;

    let input: UpdateFeedRequest = read_json(body)?;
    input.apply_to(&mut feed);

    let mut v = Validator::new();
    validate_feed(&mut v, &feed);
    if !v.valid() {
        return Err(AppError::ValidationFailed(v.into_errors()));
    }

    state.repository.update(&mut feed).await?;
    info!(feed_id = feed.id, version = feed.version, "feed updated");
    Ok(Json(FeedEnvelope { feed }))
}

/// DELETE /v1/feeds/{id}
pub async fn delete_feed(
    State(state): State<AppState>,
    FeedId(id): FeedId,
) -> HandlerResult<MessageEnvelope> {
    state.repository.delete(id).await?;
    info!(feed_id = id, "feed deleted");
    Ok(Json(MessageEnvelope {
        message: "feed successfully deleted".to_string(),
    }))
}

// =============================================================================
// Fallbacks
// =============================================================================

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
}

pub async fn method_not_allowed(method: Method) -> Response {
    method_not_allowed_response(&method)
}
