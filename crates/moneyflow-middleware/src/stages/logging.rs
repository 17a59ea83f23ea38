//! Request logging.
//!
//! Logs one line when a request starts and one when it completes. The
//! completion line carries the status recorded in the context (or the
//! status of the returned response) and the elapsed time.

use moneyflow_core::RequestContext;

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{HandlerResult, Request};

/// Logs request start and completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    /// Creates the logging interceptor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            tracing::info!(
                trace_id = %ctx.trace_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                "request started"
            );

            let result = next.run(ctx, request).await;

            let status = ctx
                .status()
                .or_else(|| result.as_ref().ok().map(|r| r.status()))
                .map_or(0, |s| s.as_u16());
            let duration_ms = ctx.elapsed().as_secs_f64() * 1000.0;

            match &result {
                Ok(_) => tracing::info!(
                    trace_id = %ctx.trace_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    status,
                    duration_ms,
                    "request completed"
                ),
                Err(err) => tracing::warn!(
                    trace_id = %ctx.trace_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    error = %err,
                    duration_ms,
                    "request failed"
                ),
            }

            result
        })
    }
}
