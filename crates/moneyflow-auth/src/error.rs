//! Authentication errors.

use std::path::PathBuf;

use moneyflow_core::{ApiError, ClaimsError};
use thiserror::Error;

/// Message sent to clients for every authentication failure.
pub const FORBIDDEN_MESSAGE: &str = "you are not authorized for that action";

/// Errors raised while loading keys or verifying a token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The `Authorization` header is not `Bearer <token>`.
    #[error("expected authorization header format: Bearer <token>")]
    MalformedHeader,

    /// The `Authorization` header is not `Basic <base64(email:password)>`.
    #[error("expected authorization header format: Basic <credentials>")]
    MalformedBasic,

    /// The token names a key id that is not in the key store.
    #[error("unknown signing key id '{0}'")]
    UnknownKey(String),

    /// Signature, encoding, algorithm or issuer check failed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The decoded claims are expired or have no subject.
    #[error("invalid claims: {0}")]
    InvalidClaims(#[from] ClaimsError),

    /// A key file could not be read.
    #[error("reading key file {path}: {source}")]
    KeyFile {
        /// Path of the key file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Every authentication failure is reported to the client as forbidden,
/// whatever the underlying cause.
impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        ApiError::forbidden(FORBIDDEN_MESSAGE)
    }
}
