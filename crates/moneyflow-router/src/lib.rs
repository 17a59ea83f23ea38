//! Radix tree router for the moneyflow API.
//!
//! Routes are `(method, template)` pairs where templates use `:name`
//! segments (`/v1/users/:id`). Matching is exact: every path segment must
//! be consumed, there are no wildcards and no prefix matches.
//!
//! # Example
//!
//! ```rust
//! use moneyflow_router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(&Method::GET, "/v1/expenses/:id", "get_expense").unwrap();
//! router.insert(&Method::DELETE, "/v1/expenses/:id", "delete_expense").unwrap();
//!
//! let m = router.match_route(&Method::DELETE, "/v1/expenses/7").unwrap();
//! assert_eq!(*m.value, "delete_expense");
//! assert_eq!(m.params.get("id"), Some("7"));
//!
//! // Two templates matching the same paths are rejected up front.
//! assert!(router.insert(&Method::GET, "/v1/expenses/:expense_id", "dup").is_err());
//! ```
//!
//! # Architecture
//!
//! ```text
//!                 (root)
//!                   │
//!                 "v1"
//!                   │
//!        ┌──────────┴──────────┐
//!     "incomes"              "users"
//!        │                     │
//!   ┌────┴────┐              ":" ──── [GET id, PUT id, DELETE id]
//! "user"     ":" [GET id]      │
//!   │         │               ":" ─── [GET page,rows]
//!  ":"       ":" [GET page,rows]
//!  [GET user_id]
//! ```
//!
//! Parameter nodes carry no name; names are recorded per endpoint.

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_router::{Endpoint, MethodRouter};
pub use node::{parse_template, Node, Segment};
pub use params::Params;
pub use router::Router;

/// A matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the route.
    pub value: &'a T,
    /// The template that matched, e.g. `/v1/users/:id`.
    pub template: &'a str,
    /// Parameters bound by the match.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, template: &'a str, params: Params) -> Self {
        Self {
            value,
            template,
            params,
        }
    }
}
