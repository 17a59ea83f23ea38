//! The route table and request dispatch.

use std::sync::Arc;

use http::header::HeaderValue;
use http::{Method, StatusCode};
use moneyflow_core::{ApiError, RequestContext};
use moneyflow_middleware::{Chain, Handler, Middleware, Request, Response, ResponseExt};
use moneyflow_router::{RouteError, Router};
use tokio_util::sync::CancellationToken;

use crate::shutdown::ShutdownSignal;

/// Response header carrying the request's trace id.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Message of the response to a request no route matches.
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

/// Routes requests to handlers wrapped in their interceptor chains.
///
/// Every route runs the global chain outermost, then the route's own
/// interceptors in the order given, then the handler. Chains are built
/// once, at registration; after startup the table is only read.
///
/// ```
/// use http::Method;
/// use moneyflow_middleware::{handler_fn, Chain, Response, ResponseExt};
/// use moneyflow_server::{App, ShutdownSignal};
///
/// let mut app = App::new(ShutdownSignal::new(), Chain::new());
/// app.handle(
///     Method::GET,
///     "v1",
///     "/ping",
///     handler_fn(|_ctx, _req| Box::pin(async { Ok(Response::no_content()) })),
///     &[],
/// )
/// .unwrap();
/// assert_eq!(app.route_count(), 1);
/// ```
pub struct App {
    router: Router<Arc<dyn Handler>>,
    global: Chain,
    shutdown: ShutdownSignal,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.router.route_count())
            .field("global", &self.global.names())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Creates an app with no routes.
    ///
    /// `global` wraps every route; `shutdown` is triggered when a handler
    /// returns a shutdown error.
    #[must_use]
    pub fn new(shutdown: ShutdownSignal, global: Chain) -> Self {
        Self {
            router: Router::new(),
            global,
            shutdown,
        }
    }

    /// Registers `handler` for `method` on `/{version}{path}`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed template or one that overlaps a route already
    /// registered for the same method.
    pub fn handle(
        &mut self,
        method: Method,
        version: &str,
        path: &str,
        handler: impl Handler,
        interceptors: &[Arc<dyn Middleware>],
    ) -> Result<(), RouteError> {
        let template = if version.is_empty() {
            path.to_string()
        } else {
            format!("/{version}{path}")
        };

        let chain = interceptors
            .iter()
            .fold(self.global.clone(), |chain, mw| chain.with_shared(Arc::clone(mw)));
        let wrapped = chain.wrap(Arc::new(handler));

        self.router.insert(&method, &template, wrapped)?;
        tracing::debug!(%method, %template, chain = ?chain.names(), "route registered");
        Ok(())
    }

    /// Number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.router.route_count()
    }

    /// The signal handlers trigger through shutdown errors.
    #[must_use]
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Runs `request` through its route.
    ///
    /// An unmatched method and path answers 404 without running any
    /// interceptor. `None` means a handler asked for process shutdown: the
    /// signal has been triggered and the caller must drop the connection
    /// without responding.
    pub async fn dispatch(&self, request: Request, cancel: CancellationToken) -> Option<Response> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let Some(route) = self.router.match_route(&method, &path) else {
            tracing::debug!(%method, %path, "no route matched");
            return Some(Response::envelope(
                StatusCode::NOT_FOUND,
                &ApiError::not_found(NOT_FOUND_MESSAGE).to_envelope(),
            ));
        };

        let handler = Arc::clone(route.value);
        let mut ctx = RequestContext::new(method, path)
            .with_params(route.params)
            .with_cancellation(cancel);
        let trace_id = ctx.trace_id();

        let mut response = match handler.call(&mut ctx, request).await {
            Ok(response) => response,
            Err(err) if err.is_shutdown() => {
                tracing::error!(%trace_id, error = %err, "handler requested shutdown");
                self.shutdown.trigger();
                return None;
            }
            Err(err) => {
                tracing::warn!(%trace_id, error = %err, "error escaped the interceptor chain");
                let status = err.status_code().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Response::envelope(status, &err.to_envelope())
            }
        };

        if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
            response.headers_mut().insert(TRACE_ID_HEADER, value);
        }
        Some(response)
    }
}
