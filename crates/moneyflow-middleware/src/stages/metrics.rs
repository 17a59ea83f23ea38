//! Request metrics.
//!
//! Emits through the `metrics` facade, so whichever recorder the process
//! installed (the Prometheus exporter in production, none in tests)
//! receives:
//!
//! - `moneyflow_requests_total` - counter by method and status class
//! - `moneyflow_errors_total` - counter by error kind and status class
//! - `moneyflow_request_duration_seconds` - histogram by method
//!
//! The status class (`2xx`, `4xx`, `5xx`...) is taken from the response,
//! or from the status an error will be answered with.
//!
//! The interceptor also keeps its own totals, readable via
//! [`MetricsMiddleware::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use http::StatusCode;
use moneyflow_core::RequestContext;

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{HandlerResult, Request};

/// Counter of requests handled.
pub const REQUESTS_TOTAL: &str = "moneyflow_requests_total";

/// Counter of requests that ended in an error.
pub const ERRORS_TOTAL: &str = "moneyflow_errors_total";

/// Histogram of request latency in seconds.
pub const REQUEST_DURATION: &str = "moneyflow_request_duration_seconds";

/// Point-in-time request totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Requests seen.
    pub requests: u64,
    /// Requests whose result reaching this interceptor was an error.
    pub errors: u64,
}

#[derive(Debug, Default)]
struct Totals {
    requests: AtomicU64,
    errors: AtomicU64,
}

/// Counts requests and errors. Never changes the result.
#[derive(Debug, Clone, Default)]
pub struct MetricsMiddleware {
    totals: Arc<Totals>,
}

impl MetricsMiddleware {
    /// Creates the metrics interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the totals so far.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.totals.requests.load(Ordering::Relaxed),
            errors: self.totals.errors.load(Ordering::Relaxed),
        }
    }
}

impl Middleware for MetricsMiddleware {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let result = next.run(ctx, request).await;

            let method = ctx.method().to_string();
            let class = status_class(outcome_status(&result));
            self.totals.requests.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(REQUESTS_TOTAL, "method" => method.clone(), "status" => class)
                .increment(1);
            metrics::histogram!(REQUEST_DURATION, "method" => method)
                .record(ctx.elapsed().as_secs_f64());

            if let Err(err) = &result {
                self.totals.errors.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(ERRORS_TOTAL, "kind" => err.kind().as_str(), "status" => class)
                    .increment(1);
            }

            result
        })
    }
}

/// The status the client will see for `result`. Shutdown errors have no
/// response of their own and count as server errors.
fn outcome_status(result: &HandlerResult) -> StatusCode {
    match result {
        Ok(response) => response.status(),
        Err(err) => err
            .status_code()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() / 100 {
        1 => "1xx",
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        _ => "5xx",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use crate::handler::handler_fn;
    use crate::types::{Response, ResponseExt};
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use moneyflow_core::ApiError;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_counts_without_altering_result() {
        let metrics = MetricsMiddleware::new();
        let handler = Chain::new()
            .with(metrics.clone())
            .wrap(Arc::new(handler_fn(|ctx, _req| {
                Box::pin(async move {
                    if ctx.path() == "/fail" {
                        Err(ApiError::not_found("gone"))
                    } else {
                        Ok(Response::json(StatusCode::OK, &"ok"))
                    }
                })
            })));

        let mut ctx = RequestContext::new(Method::GET, "/ok");
        assert!(handler
            .call(&mut ctx, Request::new(Bytes::new()))
            .await
            .is_ok());

        let mut ctx = RequestContext::new(Method::GET, "/fail");
        let err = handler
            .call(&mut ctx, Request::new(Bytes::new()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                requests: 2,
                errors: 1
            }
        );
    }

    #[test]
    fn test_status_class_of_outcome() {
        let ok: HandlerResult = Ok(Response::json(StatusCode::CREATED, &"made"));
        assert_eq!(status_class(outcome_status(&ok)), "2xx");

        let denied: HandlerResult = Err(ApiError::forbidden("no"));
        assert_eq!(status_class(outcome_status(&denied)), "4xx");

        let unauthorized: HandlerResult = Err(ApiError::unauthorized("who"));
        assert_eq!(outcome_status(&unauthorized), StatusCode::UNAUTHORIZED);

        let internal: HandlerResult = Err(ApiError::internal("db"));
        assert_eq!(status_class(outcome_status(&internal)), "5xx");

        let shutdown: HandlerResult = Err(ApiError::shutdown("stop"));
        assert_eq!(status_class(outcome_status(&shutdown)), "5xx");

        assert_eq!(status_class(StatusCode::NOT_MODIFIED), "3xx");
        assert_eq!(status_class(StatusCode::CONTINUE), "1xx");
    }
}
