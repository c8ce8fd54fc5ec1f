//! Error classification shared by the storage and HTTP layers.
//!
//! Every failure the service can produce falls into exactly one [`ErrorKind`].
//! The HTTP layer picks status codes by matching on the kind, so adding a
//! variant here is a deliberate, compiler-checked change across the crate.

use std::fmt;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A caller-supplied identifier failed its precondition; storage was not touched.
    InvalidArgument,
    /// No row matched.
    NotFound,
    /// Optimistic-lock mismatch on update.
    EditConflict,
    /// The entity failed its business rules.
    ValidationFailed,
    /// The request body could not be decoded.
    MalformedRequest,
    /// Connectivity, timeout or any unexpected store failure.
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::EditConflict => "edit_conflict",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::MalformedRequest => "malformed_request",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::EditConflict.to_string(), "edit_conflict");
        assert_eq!(ErrorKind::StorageFailure.to_string(), "storage_failure");
    }
}
