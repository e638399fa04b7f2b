//! Result and error types for the core library

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::contact::ValidationError;

/// Remote operation that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteOperation {
    Load,
    Create,
    Update,
    Delete,
    SignIn,
    Refresh,
}

impl RemoteOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteOperation::Load => "load",
            RemoteOperation::Create => "create",
            RemoteOperation::Update => "update",
            RemoteOperation::Delete => "delete",
            RemoteOperation::SignIn => "sign_in",
            RemoteOperation::Refresh => "refresh",
        }
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemoteOperation::Load => "Loading contacts",
            RemoteOperation::Create => "Adding contact",
            RemoteOperation::Update => "Updating contact",
            RemoteOperation::Delete => "Deleting contact",
            RemoteOperation::SignIn => "Signing in",
            RemoteOperation::Refresh => "Refreshing session",
        };
        f.write_str(label)
    }
}

/// Classification of a remote failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// Timeouts, connection failures, rate limiting, server errors
    Transient,
    /// Credentials missing, expired or lacking permission
    Unauthorized,
    /// Target document does not exist
    NotFound,
    /// Request refused or response unreadable
    Rejected,
}

impl RemoteErrorKind {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => RemoteErrorKind::Unauthorized,
            404 => RemoteErrorKind::NotFound,
            408 | 429 => RemoteErrorKind::Transient,
            500..=599 => RemoteErrorKind::Transient,
            _ => RemoteErrorKind::Rejected,
        }
    }
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{operation} failed: {message}")]
    Remote {
        operation: RemoteOperation,
        kind: RemoteErrorKind,
        message: String,
    },

    #[error("{operation} finished after the contact view was closed; result discarded")]
    StaleMutation { operation: RemoteOperation },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a remote operation error
    pub fn remote(
        operation: RemoteOperation,
        kind: RemoteErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Remote {
            operation,
            kind,
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Whether repeating the same action may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Remote {
                kind: RemoteErrorKind::Transient,
                ..
            }
        )
    }

    /// Short stable identifier for logs and JSON output
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Remote { .. } => "remote",
            Error::StaleMutation { .. } => "stale_mutation",
            Error::NotFound(_) => "not_found",
            Error::Auth(_) => "auth",
            Error::Config(_) => "config",
            Error::Database(_) => "database",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Create a failed result carrying the error code and retry hint
    pub fn from_error(error: &Error) -> Self {
        let mut context = HashMap::new();
        context.insert("code".to_string(), serde_json::json!(error.code()));
        context.insert("retryable".to_string(), serde_json::json!(error.is_retryable()));
        if let Error::Remote { operation, kind, .. } = error {
            context.insert("operation".to_string(), serde_json::json!(operation));
            context.insert("kind".to_string(), serde_json::json!(kind));
        }
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            context: Some(context),
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::from_error(&e),
        }
    }
}
