//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (panic recovery, tracing,
//! compression, CORS, body limit), and creates the axum router ready for
//! serving.

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

use super::error::server_error_response;
use super::handlers;
use super::request::MAX_BODY_BYTES;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/v1/healthcheck", get(handlers::healthcheck))
        .route("/v1/admin/feeds", post(handlers::create_feed))
        .route("/v1/feeds", get(handlers::list_feeds))
        .route(
            "/v1/feeds/{id}",
            get(handlers::show_feed)
                .patch(handlers::update_feed)
                .delete(handlers::delete_feed),
        )
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// A panicking handler becomes a 500 and the connection is closed.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "handler panicked");

    let mut response = server_error_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[cfg(feature = "local-repo")]
    #[test]
    fn test_router_creation() {
        use crate::config::Environment;
        use crate::db::{FeedRepository, LocalRepository};
        use std::sync::Arc;

        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FeedRepository>;
        let state = AppState::new(repo, Environment::Development);
        let _router = create_router(state);
    }

    #[test]
    fn test_panic_response_closes_connection() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get(header::CONNECTION).unwrap(), "close");
    }
}
