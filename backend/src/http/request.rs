//! Request decoding.
//!
//! Bodies are decoded in three steps: parse one JSON value, require it to be
//! an object and map it onto the target type, then require that nothing but
//! whitespace follows. Each failure produces one fixed client message.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequestParts, Path},
    http::{request::Parts, StatusCode},
};
use serde::de::DeserializeOwned;
use serde_json::{error::Category, Map, Value};

use super::error::AppError;
use crate::models::{validate_list_options, ListOptions, DEFAULT_PAGE_SIZE};
use crate::validator::Validator;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// Turn a buffered body (or the reason it could not be buffered) into `T`.
pub fn read_json<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, AppError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            malformed(format!("body must not be larger than {} bytes", MAX_BODY_BYTES))
        } else {
            malformed(rejection.body_text())
        }
    })?;
    decode_json(&body)
}

/// Decode exactly one JSON object from `body` into `T`.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let mut stream = serde_json::Deserializer::from_slice(body).into_iter::<Value>();

    let value = match stream.next() {
        None => return Err(malformed("body must not be empty")),
        Some(Err(err)) => return Err(malformed(syntax_message(&err, body))),
        Some(Ok(value)) => value,
    };
    let value_end = stream.byte_offset();

    // A bare `null` leaves every field at its zero value.
    let value = match value {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };

    if !value.is_object() {
        let offset = match value {
            Value::Array(_) => first_token(body) + 1,
            _ => value_end,
        };
        return Err(malformed(type_message(offset)));
    }

    let decoded: T = serde_path_to_error::deserialize(value)
        .map_err(|err| malformed(data_message(&err, value_end)))?;

    if stream.next().is_some() {
        return Err(malformed("body must only contain a single JSON value"));
    }

    Ok(decoded)
}

fn malformed(message: impl Into<String>) -> AppError {
    AppError::MalformedRequest(message.into())
}

fn type_message(offset: usize) -> String {
    format!("body contains incorrect JSON type (at character {})", offset)
}

fn syntax_message(err: &serde_json::Error, body: &[u8]) -> String {
    match err.classify() {
        Category::Syntax | Category::Data => match byte_offset(body, err.line(), err.column()) {
            Some(offset) => format!("body contains badly-formed JSON (at character {})", offset),
            None => "body contains badly-formed JSON".to_string(),
        },
        Category::Eof | Category::Io => "body contains badly-formed JSON".to_string(),
    }
}

fn data_message(err: &serde_path_to_error::Error<serde_json::Error>, offset: usize) -> String {
    let inner = err.inner().to_string();
    if let Some(key) = unknown_field(&inner) {
        return format!("body contains unknown key \"{}\"", key);
    }

    let path = err.path().to_string();
    if path.is_empty() || path == "." {
        type_message(offset)
    } else {
        format!("body contains incorrect JSON type for field \"{}\"", path)
    }
}

fn unknown_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("unknown field `")?;
    rest.split('`').next()
}

/// Absolute offset of a 1-based line and column pair. Line 0 means the
/// error carries no position.
fn byte_offset(body: &[u8], line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start: usize = body
        .split(|b| *b == b'\n')
        .take(line - 1)
        .map(|l| l.len() + 1)
        .sum();
    Some(line_start + column)
}

fn first_token(body: &[u8]) -> usize {
    body.iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len())
}

/// Feed identifier from the `{id}` path segment.
///
/// Anything that is not a positive integer is rejected before the store is
/// touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedId(pub i64);

impl<S> FromRequestParts<S> for FeedId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::InvalidArgument(e.body_text()))?;
        parse_id(&raw).map(FeedId)
    }
}

pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::InvalidArgument(format!("invalid id parameter: {}", raw))),
    }
}

/// Filters and paging read from the list query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub title: String,
    pub url: String,
    pub options: ListOptions,
}

/// Read and validate `title`, `url`, `page`, `page_size` and `sort`.
pub fn read_list_query(params: &HashMap<String, String>) -> Result<ListQuery, AppError> {
    let mut v = Validator::new();

    let title = read_string(params, "title", "");
    let url = read_string(params, "url", "");
    let page = read_int(params, "page", 1, &mut v);
    let page_size = read_int(params, "page_size", DEFAULT_PAGE_SIZE, &mut v);
    let sort = read_string(params, "sort", "id");

    let options = ListOptions {
        page,
        page_size,
        sort,
    };
    validate_list_options(&mut v, &options);

    if !v.valid() {
        return Err(AppError::ValidationFailed(v.into_errors()));
    }

    Ok(ListQuery {
        title,
        url,
        options,
    })
}

fn read_string(params: &HashMap<String, String>, key: &str, default: &str) -> String {
    match params.get(key) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => default.to_string(),
    }
}

fn read_int(params: &HashMap<String, String>, key: &str, default: i64, v: &mut Validator) -> i64 {
    match params.get(key) {
        Some(value) if !value.is_empty() => value.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::dto::{CreateFeedRequest, UpdateFeedRequest};

    fn message<T: DeserializeOwned + std::fmt::Debug>(body: &str) -> String {
        match decode_json::<T>(body.as_bytes()) {
            Err(AppError::MalformedRequest(msg)) => msg,
            other => panic!("expected malformed request, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_valid_body() {
        let input: CreateFeedRequest =
            decode_json(br#"{"title": "Moana", "url": "https://a/feed"}"#).unwrap();
        assert_eq!(input.title, "Moana");
        assert_eq!(input.url, "https://a/feed");
        assert!(input.description.is_empty());
    }

    #[test]
    fn test_trailing_whitespace_is_fine() {
        let input: CreateFeedRequest = decode_json(b"{\"title\": \"x\"}\n\n  ").unwrap();
        assert_eq!(input.title, "x");
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(message::<CreateFeedRequest>(""), "body must not be empty");
        assert_eq!(message::<CreateFeedRequest>("   \n"), "body must not be empty");
    }

    #[test]
    fn test_syntax_error_reports_offset() {
        assert_eq!(
            message::<CreateFeedRequest>(r#"{"title": "Moana", }"#),
            "body contains badly-formed JSON (at character 20)"
        );
    }

    #[test]
    fn test_syntax_error_on_second_line() {
        assert_eq!(
            message::<CreateFeedRequest>("{\n\"title\": x}"),
            "body contains badly-formed JSON (at character 12)"
        );
    }

    #[test]
    fn test_truncated_body() {
        assert_eq!(
            message::<CreateFeedRequest>(r#"{"title": "Moana""#),
            "body contains badly-formed JSON"
        );
    }

    #[test]
    fn test_array_top_level() {
        assert_eq!(
            message::<CreateFeedRequest>(r#"["foo", "bar"]"#),
            "body contains incorrect JSON type (at character 1)"
        );
    }

    #[test]
    fn test_scalar_top_level() {
        assert_eq!(
            message::<CreateFeedRequest>(r#""moana""#),
            "body contains incorrect JSON type (at character 7)"
        );
    }

    #[test]
    fn test_wrong_field_type() {
        assert_eq!(
            message::<CreateFeedRequest>(r#"{"title": 123}"#),
            "body contains incorrect JSON type for field \"title\""
        );
        assert_eq!(
            message::<UpdateFeedRequest>(r#"{"url": ["x"]}"#),
            "body contains incorrect JSON type for field \"url\""
        );
    }

    #[test]
    fn test_first_error_in_document_order_wins() {
        assert_eq!(
            message::<CreateFeedRequest>(r#"{"url": 5, "title": 123}"#),
            "body contains incorrect JSON type for field \"url\""
        );
        assert_eq!(
            message::<CreateFeedRequest>(r#"{"zzz": 1, "title": 123}"#),
            "body contains unknown key \"zzz\""
        );
    }

    #[test]
    fn test_null_decodes_to_zero_values() {
        let input: CreateFeedRequest =
            decode_json(br#"{"title": null, "description": "d"}"#).unwrap();
        assert!(input.title.is_empty());
        assert_eq!(input.description, "d");

        let input: CreateFeedRequest = decode_json(b"null").unwrap();
        assert!(input.title.is_empty());
        assert!(input.url.is_empty());
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            message::<CreateFeedRequest>(r#"{"title": "Moana", "rating": 5}"#),
            "body contains unknown key \"rating\""
        );
    }

    #[test]
    fn test_multiple_values() {
        assert_eq!(
            message::<CreateFeedRequest>(r#"{"title": "Moana"}{"title": "Frozen"}"#),
            "body must only contain a single JSON value"
        );
        assert_eq!(
            message::<CreateFeedRequest>(r#"{"title": "Moana"} :~()"#),
            "body must only contain a single JSON value"
        );
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("0"), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse_id("-3"), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse_id("abc"), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse_id(""), Err(AppError::InvalidArgument(_))));
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_list_query_defaults() {
        let query = read_list_query(&HashMap::new()).unwrap();
        assert_eq!(query.title, "");
        assert_eq!(query.options, ListOptions::default());
    }

    #[test]
    fn test_list_query_values() {
        let query = read_list_query(&params(&[
            ("title", "rust"),
            ("page", "2"),
            ("page_size", "5"),
            ("sort", "-title"),
        ]))
        .unwrap();
        assert_eq!(query.title, "rust");
        assert_eq!(query.options.page, 2);
        assert_eq!(query.options.page_size, 5);
        assert_eq!(query.options.sort, "-title");
    }

    #[test]
    fn test_list_query_rejects_non_integers() {
        match read_list_query(&params(&[("page", "abc"), ("page_size", "1.5")])) {
            Err(AppError::ValidationFailed(errors)) => {
                assert_eq!(errors.get("page"), Some("must be an integer value"));
                assert_eq!(errors.get("page_size"), Some("must be an integer value"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_list_query_rejects_bad_sort() {
        match read_list_query(&params(&[("sort", "created_at")])) {
            Err(AppError::ValidationFailed(errors)) => {
                assert_eq!(errors.get("sort"), Some("invalid sort value"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
