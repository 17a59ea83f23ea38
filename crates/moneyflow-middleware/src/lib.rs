//! # Moneyflow Middleware
//!
//! Interceptor chains for the moneyflow API.
//!
//! A handler is wrapped once, at route registration, by the global chain
//! followed by the route's own interceptors:
//!
//! ```text
//! Request → Logging → Errors → Metrics → Panics → Authenticate → Authorize → Handler
//!                                                                              ↓
//! Response ←───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Interceptors see the request on the way in and the
//! [`HandlerResult`] on the way out. The errors interceptor is the one
//! place where an [`ApiError`](moneyflow_core::ApiError) becomes a JSON
//! response; only shutdown errors travel past it.

#![doc(html_root_url = "https://docs.rs/moneyflow-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod handler;
pub mod middleware;
pub mod stages;
pub mod types;

pub use chain::Chain;
pub use handler::{handler_fn, operation, Handler, HandlerFn, Operation, OperationFn};
pub use middleware::{BoxFuture, Middleware, Next};
pub use stages::{
    AuthenticateMiddleware, AuthorizeMiddleware, ErrorsMiddleware, LoggingMiddleware,
    MetricsMiddleware, MetricsSnapshot, PanicsMiddleware,
};
pub use types::{HandlerResult, Request, Response, ResponseExt};
