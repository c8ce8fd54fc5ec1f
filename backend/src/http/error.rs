//! HTTP error handling and response types.
//!
//! [`AppError`] is the single place where failures become status codes.
//! Status selection goes through [`ErrorKind`]; storage details are logged
//! here and never written to the response.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::dto::{ErrorBody, ErrorEnvelope};
use crate::db::RepositoryError;
use crate::error::ErrorKind;
use crate::validator::ValidationErrors;

pub const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";
pub const EDIT_CONFLICT_MESSAGE: &str =
    "unable to update the record due to an edit conflict, please try again";
pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Identifier from the URL failed its precondition
    InvalidArgument(String),
    /// Body could not be decoded; the message is shown to the client
    MalformedRequest(String),
    /// Entity or query failed its rules
    ValidationFailed(ValidationErrors),
    /// Repository error
    Repository(RepositoryError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::MalformedRequest(_) => ErrorKind::MalformedRequest,
            AppError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            AppError::Repository(e) => e.kind(),
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.kind())
    }
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        // An id that can never exist is reported like one that does not.
        ErrorKind::InvalidArgument | ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::EditConflict => StatusCode::CONFLICT,
        ErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::MalformedRequest => StatusCode::BAD_REQUEST,
        ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error envelope with a single message.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorEnvelope {
            error: ErrorBody::Message(message.into()),
        }),
    )
        .into_response()
}

/// The generic 500 response. Nothing about the cause is included.
pub fn server_error_response() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE)
}

pub fn method_not_allowed_response(method: &Method) -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("the {} method is not supported for this resource", method),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::ValidationFailed(errors) => (
                status,
                Json(ErrorEnvelope {
                    error: ErrorBody::Fields(errors),
                }),
            )
                .into_response(),
            AppError::MalformedRequest(message) => error_response(status, message),
            AppError::InvalidArgument(_) => error_response(status, NOT_FOUND_MESSAGE),
            AppError::Repository(e) => match e.kind() {
                ErrorKind::InvalidArgument | ErrorKind::NotFound => {
                    error_response(status, NOT_FOUND_MESSAGE)
                }
                ErrorKind::EditConflict => error_response(status, EDIT_CONFLICT_MESSAGE),
                _ => {
                    error!(error = %e, kind = %e.kind(), "request failed");
                    server_error_response()
                }
            },
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}
