//! Transport-agnostic error payload.
//!
//! Command failures and port outages end up here so any adapter (HTTP,
//! form redisplay, the `costlog-check` report) renders them the same way:
//! a stable `code`, a human message, and optional structured `details`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The submission failed validation.
    InvalidRequest,
    /// The actor lacks the permission for the action.
    Forbidden,
    /// The addressed entry or issue does not exist.
    NotFound,
    /// A collaborator could not be reached.
    ServiceUnavailable,
    /// A collaborator misbehaved.
    InternalError,
}

impl ErrorCode {
    /// Snake-case name as serialised.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::ServiceUnavailable => "service_unavailable",
            Self::InternalError => "internal_error",
        }
    }

    /// Message used when a caller supplies none.
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "request is invalid",
            Self::Forbidden => "action is not permitted",
            Self::NotFound => "resource not found",
            Self::ServiceUnavailable => "a required service is unavailable",
            Self::InternalError => "internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload handed to adapters.
///
/// `message` is never blank: constructors substitute the code's default
/// message, and deserialisation rejects blank input.
///
/// # Examples
/// ```
/// use costs::domain::{Error, ErrorCode};
/// use serde_json::json;
///
/// let err = Error::forbidden("edit denied: foreign_entry")
///     .with_details(json!({ "action": "edit", "reason": "foreign_entry" }));
/// assert_eq!(err.code(), ErrorCode::Forbidden);
/// assert_eq!(err.to_string(), "edit denied: foreign_entry");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase", try_from = "ErrorWire")]
#[error("{message}")]
pub struct Error {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Rejection raised when a serialised payload carries a blank message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was empty or whitespace.
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl Error {
    /// Build an error, falling back to [`ErrorCode::default_message`] when
    /// `message` is blank.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.default_message().to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            details: None,
        }
    }

    /// Failure category.
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured context such as per-field error codes.
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ErrorWire {
    code: ErrorCode,
    message: String,
    #[serde(default)]
    details: Option<Value>,
}

impl TryFrom<ErrorWire> for Error {
    type Error = ErrorValidationError;

    fn try_from(wire: ErrorWire) -> Result<Self, Self::Error> {
        if wire.message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code: wire.code,
            message: wire.message,
            details: wire.details,
        })
    }
}
