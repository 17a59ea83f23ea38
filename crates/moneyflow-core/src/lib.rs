//! # Moneyflow Core
//!
//! Core types shared by every layer of the moneyflow API:
//!
//! - [`RequestContext`] - per-request state (trace id, status slot, claims, params)
//! - [`Claims`] - verified identity with the `has_role` / `is_owner` predicates
//! - [`ApiError`] - the classified error every handler returns
//! - [`check`] / [`check_id`] - validation collaborators

#![doc(html_root_url = "https://docs.rs/moneyflow-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod claims;
mod context;
mod error;
mod validate;

pub use claims::{roles, Claims, ClaimsError};
pub use context::{RequestContext, TraceId};
pub use error::{
    ApiError, ApiResult, ErrorEnvelope, ErrorKind, INTERNAL_MESSAGE, VALIDATION_MESSAGE,
};
pub use moneyflow_router::Params;
pub use validate::{check, check_id, generate_id, FieldError, FieldErrors, Validate};
