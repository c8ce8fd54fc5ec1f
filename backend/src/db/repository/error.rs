//! Error types for repository operations.
//!
//! Repositories only ever fail in four ways. Each variant carries a message
//! plus an [`ErrorContext`] describing where the failure happened; the context
//! is meant for server-side logs and is never shown to API clients.

use std::fmt;

use crate::error::ErrorKind;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Structured context for repository errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "create", "update")
    pub operation: Option<String>,
    /// The entity type involved
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the entity type.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the entity ID.
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A caller-supplied identifier failed its precondition. No query was issued.
    #[error("Invalid argument: {message} {context}")]
    InvalidArgument {
        message: String,
        context: ErrorContext,
    },

    /// Requested entity was not found.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// The conditional update matched no row: the version presented by the
    /// caller is stale, or the row is gone.
    #[error("Edit conflict: {message} {context}")]
    EditConflict {
        message: String,
        context: ErrorContext,
    },

    /// Connection, timeout or any other store failure.
    #[error("Storage failure: {message} {context}")]
    StorageFailure {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn invalid_argument_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            context,
        }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a not found error with context.
    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn edit_conflict(message: impl Into<String>) -> Self {
        Self::EditConflict {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn edit_conflict_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::EditConflict {
            message: message.into(),
            context,
        }
    }

    /// Create a storage failure.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageFailure {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a storage failure with context.
    pub fn storage_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::StorageFailure {
            message: message.into(),
            context,
        }
    }

    /// A call that exceeded its deadline. Surfaces as a storage failure.
    pub fn timeout(operation: impl Into<String>, limit: std::time::Duration) -> Self {
        Self::StorageFailure {
            message: format!("operation timed out after {}ms", limit.as_millis()),
            context: ErrorContext::new(operation).with_details("timeout"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::EditConflict { .. } => ErrorKind::EditConflict,
            Self::StorageFailure { .. } => ErrorKind::StorageFailure,
        }
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::InvalidArgument { context, .. }
            | Self::NotFound { context, .. }
            | Self::EditConflict { context, .. }
            | Self::StorageFailure { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::InvalidArgument { context, .. }
            | Self::NotFound { context, .. }
            | Self::EditConflict { context, .. }
            | Self::StorageFailure { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => RepositoryError::not_found("Record not found"),
            diesel::result::Error::DatabaseError(kind, info) => {
                let details = match kind {
                    // statement_timeout cancels the query server-side
                    diesel::result::DatabaseErrorKind::Unknown
                        if info.message().contains("statement timeout") =>
                    {
                        "timeout".to_string()
                    }
                    other => format!("db_error_kind={:?}", other),
                };
                RepositoryError::storage_with_context(
                    info.message().to_string(),
                    ErrorContext::default().with_details(details),
                )
            }
            other => RepositoryError::storage(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::storage_with_context(
            err.to_string(),
            ErrorContext::default().with_details("pool_error"),
        )
    }
}
