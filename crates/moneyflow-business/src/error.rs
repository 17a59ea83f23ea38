//! Business errors.

use moneyflow_core::{ApiError, FieldErrors};
use moneyflow_store::StoreError;
use thiserror::Error;

/// Message for malformed identifiers.
pub const INVALID_ID_MESSAGE: &str = "ID is not in its proper form";

/// Message for a rejected email and password pair.
pub const AUTH_FAILED_MESSAGE: &str = "authentication failed";

/// Message for an access check that failed inside a core operation.
pub const DENIED_MESSAGE: &str = "you are not authorized for that action";

/// Errors raised by the business cores.
#[derive(Debug, Error)]
pub enum BusinessError {
    /// The addressed record does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// Resource name, e.g. `income`.
        resource: &'static str,
    },

    /// An identifier is not a UUID.
    #[error("{INVALID_ID_MESSAGE}")]
    InvalidId,

    /// The email and password did not match a user.
    #[error("{AUTH_FAILED_MESSAGE}")]
    AuthFailed,

    /// An access check run inside the operation refused the caller.
    #[error("{DENIED_MESSAGE}")]
    Denied,

    /// Input broke field rules.
    #[error("validating data: {0}")]
    Validation(FieldErrors),

    /// Hashing or verifying a password failed.
    #[error("password hashing: {0}")]
    Password(String),

    /// The storage layer failed.
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl BusinessError {
    /// A validation error on a single field.
    pub fn field(field: &str, error: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.add(field, error);
        Self::Validation(fields)
    }

    /// Maps a store `NotFound` to this resource's not-found error.
    pub(crate) fn missing(resource: &'static str) -> impl Fn(StoreError) -> Self {
        move |err| match err {
            StoreError::NotFound => Self::NotFound { resource },
            other => Self::Store(other),
        }
    }
}

impl From<BusinessError> for ApiError {
    fn from(err: BusinessError) -> Self {
        match err {
            BusinessError::NotFound { resource } => {
                ApiError::not_found(format!("{resource} not found"))
            }
            BusinessError::InvalidId => ApiError::invalid_id(INVALID_ID_MESSAGE),
            BusinessError::AuthFailed => ApiError::unauthorized(AUTH_FAILED_MESSAGE),
            BusinessError::Denied => ApiError::forbidden(DENIED_MESSAGE),
            BusinessError::Validation(fields) => ApiError::validation(fields),
            err @ BusinessError::Password(_) => {
                ApiError::internal_with_source("password hashing failure", err)
            }
            BusinessError::Store(source) => ApiError::internal_with_source("store failure", source),
        }
    }
}
