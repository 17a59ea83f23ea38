//! Ordered interceptor chains.

use std::sync::Arc;

use moneyflow_core::RequestContext;

use crate::handler::Handler;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{HandlerResult, Request};

/// An ordered list of interceptors.
///
/// The first interceptor added is the outermost: it sees the request first
/// and the result last. Wrapping happens once, at registration, so
/// dispatching a request does no chain assembly.
///
/// ```
/// use std::sync::Arc;
/// use moneyflow_middleware::{handler_fn, Chain, LoggingMiddleware, PanicsMiddleware};
///
/// let chain = Chain::new()
///     .with(LoggingMiddleware::new())
///     .with(PanicsMiddleware::new());
/// assert_eq!(chain.names(), vec!["logging", "panics"]);
///
/// let handler = chain.wrap(Arc::new(handler_fn(|_ctx, _req| {
///     Box::pin(async { Err(moneyflow_core::ApiError::not_found("none")) })
/// })));
/// # let _ = handler;
/// ```
#[derive(Clone, Default)]
pub struct Chain {
    interceptors: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor inside the ones already present.
    #[must_use]
    pub fn with(self, middleware: impl Middleware) -> Self {
        self.with_shared(Arc::new(middleware))
    }

    /// Appends a shared interceptor.
    #[must_use]
    pub fn with_shared(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.interceptors.push(middleware);
        self
    }

    /// Returns a chain running `self` outside `inner`.
    #[must_use]
    pub fn then(&self, inner: &Chain) -> Chain {
        let mut interceptors = self.interceptors.clone();
        interceptors.extend(inner.interceptors.iter().cloned());
        Chain { interceptors }
    }

    /// Interceptor names, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|m| m.name()).collect()
    }

    /// Number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain has no interceptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Wraps `handler` so that every interceptor runs around it.
    pub fn wrap(&self, handler: Arc<dyn Handler>) -> Arc<dyn Handler> {
        self.interceptors
            .iter()
            .rev()
            .fold(handler, |inner, middleware| {
                Arc::new(Wrapped {
                    middleware: Arc::clone(middleware),
                    inner,
                })
            })
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

struct Wrapped {
    middleware: Arc<dyn Middleware>,
    inner: Arc<dyn Handler>,
}

impl Handler for Wrapped {
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        self.middleware
            .process(ctx, request, Next::new(self.inner.as_ref()))
    }
}
