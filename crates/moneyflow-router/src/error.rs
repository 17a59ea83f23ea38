//! Registration errors.

use http::Method;
use thiserror::Error;

/// Errors raised while building the route table.
///
/// Every variant is a startup-time failure; a router that was built
/// successfully never errors during matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The template is syntactically invalid.
    #[error("invalid route template '{template}': {reason}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Two templates registered for the same method match exactly the
    /// same set of paths.
    #[error("route {method} {template} conflicts with {method} {existing}")]
    Conflict {
        /// HTTP method both routes were registered for.
        method: Method,
        /// Template registered first.
        existing: String,
        /// Template that was rejected.
        template: String,
    },

    /// The method has no routing slot.
    #[error("unsupported method {0}")]
    UnsupportedMethod(Method),
}
