//! # Moneyflow Auth
//!
//! Bearer token authentication, plus [`parse_basic`] for the credentials
//! exchanged for a token. [`Authenticator`] turns a signed token
//! into verified [`Claims`](moneyflow_core::Claims); every failure maps to
//! a forbidden [`ApiError`](moneyflow_core::ApiError) so callers cannot
//! tell a bad signature from an expired token.

#![doc(html_root_url = "https://docs.rs/moneyflow-auth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod authenticator;
mod error;
mod keys;

pub use authenticator::{parse_basic, parse_bearer, Authenticator};
pub use error::{AuthError, FORBIDDEN_MESSAGE};
pub use keys::KeyStore;
