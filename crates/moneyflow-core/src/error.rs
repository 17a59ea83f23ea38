//! Classified errors.
//!
//! Every error that leaves a handler or interceptor is an [`ApiError`].
//! Its [`ErrorKind`] alone decides the transport status:
//!
//! | kind         | status | body                               |
//! |--------------|--------|------------------------------------|
//! | `Validation` | 400    | message plus per-field `fields`    |
//! | `InvalidId`  | 400    | message                            |
//! | `NotFound`   | 404    | message                            |
//! | `Unauthorized` | 401  | message                            |
//! | `Forbidden`  | 403    | message                            |
//! | `Internal`   | 500    | generic text, cause only in logs   |
//! | `Shutdown`   | none   | the server starts graceful shutdown |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validate::{FieldError, FieldErrors};

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Message sent to clients in place of any internal cause.
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Message used for validation failures that carry field causes.
pub const VALIDATION_MESSAGE: &str = "data validation error";

/// The fixed set of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Client input broke one or more field rules.
    Validation,
    /// The addressed resource does not exist.
    NotFound,
    /// A resource identifier is malformed.
    InvalidId,
    /// Login credentials were rejected.
    Unauthorized,
    /// Missing or insufficient credentials.
    Forbidden,
    /// Unrecoverable; the process must shut down.
    Shutdown,
    /// Anything else. Opaque to the client.
    Internal,
}

impl ErrorKind {
    /// Returns the status code for this kind, or `None` for `Shutdown`.
    #[must_use]
    pub const fn status_code(self) -> Option<StatusCode> {
        match self {
            Self::Validation | Self::InvalidId => Some(StatusCode::BAD_REQUEST),
            Self::NotFound => Some(StatusCode::NOT_FOUND),
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Forbidden => Some(StatusCode::FORBIDDEN),
            Self::Internal => Some(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Shutdown => None,
        }
    }

    /// Returns `true` for kinds caused by the client and safe to describe.
    #[must_use]
    pub const fn is_trusted(self) -> bool {
        matches!(
            self,
            Self::Validation
                | Self::NotFound
                | Self::InvalidId
                | Self::Unauthorized
                | Self::Forbidden
        )
    }

    /// Returns the kind as a static label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::InvalidId => "invalid_id",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Shutdown => "shutdown",
            Self::Internal => "internal",
        }
    }
}

/// A classified error.
///
/// # Example
///
/// ```
/// use moneyflow_core::{ApiError, ErrorKind};
/// use http::StatusCode;
///
/// let err = ApiError::not_found("income not found");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
/// assert!(err.is_trusted());
///
/// let err = ApiError::internal_with_source("query failed", std::io::Error::other("disk"));
/// assert_eq!(err.to_envelope().error, "Internal Server Error");
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client input broke field rules.
    #[error("{message}")]
    Validation {
        /// Summary sent to the client.
        message: String,
        /// Per-field causes; empty for whole-payload failures.
        fields: FieldErrors,
    },

    /// Resource not found.
    #[error("{message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Malformed identifier.
    #[error("{message}")]
    InvalidId {
        /// Human-readable error message.
        message: String,
    },

    /// Login credentials were rejected.
    #[error("{message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
    },

    /// Authentication or authorization failed.
    #[error("{message}")]
    Forbidden {
        /// Human-readable error message.
        message: String,
    },

    /// The process must stop.
    #[error("shutdown requested: {message}")]
    Shutdown {
        /// Why shutdown was requested.
        message: String,
    },

    /// Internal failure.
    #[error("internal error: {message}")]
    Internal {
        /// Server-side description.
        message: String,
        /// The underlying error (never exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ApiError {
    /// Creates a validation error from field causes.
    #[must_use]
    pub fn validation(fields: FieldErrors) -> Self {
        Self::Validation {
            message: VALIDATION_MESSAGE.to_string(),
            fields,
        }
    }

    /// Creates a validation error without field causes.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: FieldErrors::new(),
        }
    }

    /// Creates a validation error for a single field.
    #[must_use]
    pub fn invalid_field(field: &str, error: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.add(field, error);
        Self::validation(fields)
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an invalid-identifier error.
    #[must_use]
    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a shutdown error.
    #[must_use]
    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping a cause.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidId { .. } => ErrorKind::InvalidId,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Shutdown { .. } => ErrorKind::Shutdown,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the status code, or `None` for shutdown errors.
    #[must_use]
    pub const fn status_code(&self) -> Option<StatusCode> {
        self.kind().status_code()
    }

    /// Returns `true` if the error is safe to describe to the client.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        self.kind().is_trusted()
    }

    /// Returns `true` for shutdown errors.
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown { .. })
    }

    /// Returns the field causes of a validation error.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Builds the response body.
    ///
    /// Untrusted errors collapse to [`INTERNAL_MESSAGE`]; `fields` is
    /// present only for validation errors that carry causes.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Validation { message, fields } => ErrorEnvelope {
                error: message.clone(),
                fields: (!fields.is_empty()).then(|| fields.iter().cloned().collect()),
            },
            Self::NotFound { message }
            | Self::InvalidId { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message } => ErrorEnvelope {
                error: message.clone(),
                fields: None,
            },
            Self::Shutdown { .. } | Self::Internal { .. } => ErrorEnvelope {
                error: INTERNAL_MESSAGE.to_string(),
                fields: None,
            },
        }
    }
}

/// JSON body written for an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Client-facing message.
    pub error: String,
    /// Per-field causes, only for validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::validation(FieldErrors::new()), Some(StatusCode::BAD_REQUEST)),
            (ApiError::invalid_id("bad id"), Some(StatusCode::BAD_REQUEST)),
            (ApiError::not_found("gone"), Some(StatusCode::NOT_FOUND)),
            (ApiError::unauthorized("who"), Some(StatusCode::UNAUTHORIZED)),
            (ApiError::forbidden("no"), Some(StatusCode::FORBIDDEN)),
            (ApiError::internal("boom"), Some(StatusCode::INTERNAL_SERVER_ERROR)),
            (ApiError::shutdown("integrity"), None),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error:?}");
        }
    }

    #[test]
    fn test_trusted_kinds() {
        assert!(ApiError::not_found("x").is_trusted());
        assert!(ApiError::forbidden("x").is_trusted());
        assert!(ApiError::unauthorized("x").is_trusted());
        assert!(ApiError::invalid_id("x").is_trusted());
        assert!(ApiError::bad_request("x").is_trusted());
        assert!(!ApiError::internal("x").is_trusted());
        assert!(!ApiError::shutdown("x").is_trusted());
    }

    #[test]
    fn test_validation_envelope_has_fields() {
        let err = ApiError::invalid_field("name", "name is a required field");
        let json = serde_json::to_value(err.to_envelope()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "data validation error",
                "fields": [{"field": "name", "error": "name is a required field"}]
            })
        );
    }

    #[test]
    fn test_trusted_envelope_has_no_fields() {
        let json = serde_json::to_value(ApiError::forbidden("you are not authorized").to_envelope())
            .unwrap();
        assert_eq!(json, serde_json::json!({"error": "you are not authorized"}));
    }

    #[test]
    fn test_bad_request_envelope_omits_empty_fields() {
        let envelope = ApiError::bad_request("unable to decode payload").to_envelope();
        assert_eq!(envelope.error, "unable to decode payload");
        assert!(envelope.fields.is_none());
    }

    #[test]
    fn test_internal_cause_not_echoed() {
        let err = ApiError::internal_with_source(
            "select income",
            std::io::Error::other("connection reset by peer"),
        );
        let body = serde_json::to_string(&err.to_envelope()).unwrap();
        assert!(!body.contains("connection reset"));
        assert!(!body.contains("select income"));
        assert!(body.contains(INTERNAL_MESSAGE));

        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("connection reset"));
    }

    #[test]
    fn test_only_shutdown_is_shutdown() {
        assert!(ApiError::shutdown("x").is_shutdown());
        assert!(!ApiError::internal("x").is_shutdown());
    }
}
