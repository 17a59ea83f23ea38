//! HTTP serving for the moneyflow API.
//!
//! - [`App`]: the route table. Each route is a handler wrapped in the
//!   global interceptor chain plus its own interceptors.
//! - [`Server`]: the hyper accept loop, per-request deadlines and
//!   cancellation, and the liveness and readiness probes.
//! - [`ShutdownSignal`]: process-wide shutdown, triggered by the operator
//!   or by a handler returning a shutdown error.
//!
//! ```rust,ignore
//! let mut app = App::new(ShutdownSignal::new(), stages::standard(MetricsMiddleware::new()));
//! app.handle(Method::GET, "v1", "/users/:id", handler, &[authenticate])?;
//!
//! Server::new(ServerConfig::default(), app).run().await?;
//! ```

#![warn(missing_docs)]

mod app;
mod config;
mod error;
mod health;
mod server;
mod shutdown;

pub use app::{App, NOT_FOUND_MESSAGE, TRACE_ID_HEADER};
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_CANCEL_GRACE_MILLIS, DEFAULT_HTTP_ADDR,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::ServerError;
pub use health::{
    HealthCheck, HealthStatus, ReadinessCheck, ReadinessStatus, LIVENESS_PATH, READINESS_PATH,
};
pub use server::{Server, BODY_TOO_LARGE_MESSAGE, TIMEOUT_MESSAGE};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
