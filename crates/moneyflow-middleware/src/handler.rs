//! Terminal request handlers.

use std::sync::Arc;

use moneyflow_core::RequestContext;

use crate::middleware::BoxFuture;
use crate::types::{HandlerResult, Request};

/// The innermost step of a chain: turns a request into a response or a
/// classified error.
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, request: Request)
        -> BoxFuture<'a, HandlerResult>;
}

/// A [`Handler`] backed by a closure. See [`handler_fn`].
pub struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.0)(ctx, request)
    }
}

/// Wraps a closure as a [`Handler`].
///
/// ```
/// use moneyflow_middleware::{handler_fn, Response, ResponseExt};
/// use http::StatusCode;
///
/// let handler = handler_fn(|_ctx, _req| {
///     Box::pin(async { Ok(Response::json(StatusCode::OK, &"pong")) })
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    HandlerFn(f)
}

/// Signature of a handler method on a shared state value.
pub type OperationFn<S> =
    for<'a> fn(&'a S, &'a mut RequestContext, Request) -> BoxFuture<'a, HandlerResult>;

/// A method on shared state, bound as a [`Handler`].
///
/// Resource handler groups keep their collaborators in one struct and
/// expose each route as a method; `Operation` pairs the struct with one
/// of those methods.
pub struct Operation<S> {
    state: Arc<S>,
    op: OperationFn<S>,
}

impl<S: Send + Sync + 'static> Handler for Operation<S> {
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.op)(self.state.as_ref(), ctx, request)
    }
}

/// Binds `op` to `state`.
pub fn operation<S: Send + Sync + 'static>(state: Arc<S>, op: OperationFn<S>) -> Operation<S> {
    Operation { state, op }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Response, ResponseExt};
    use bytes::Bytes;
    use http::{Method, StatusCode};

    struct Greeter {
        greeting: String,
    }

    impl Greeter {
        fn greet<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            _request: Request,
        ) -> BoxFuture<'a, HandlerResult> {
            Box::pin(async move {
                let name = ctx.param("name").unwrap_or("nobody");
                Ok(Response::json(
                    StatusCode::OK,
                    &format!("{} {name}", self.greeting),
                ))
            })
        }
    }

    #[tokio::test]
    async fn test_operation_calls_bound_method() {
        let state = Arc::new(Greeter {
            greeting: "hello".into(),
        });
        let handler = operation(state, Greeter::greet);
        let mut ctx = RequestContext::new(Method::GET, "/greet")
            .with_params([("name".to_string(), "ada".to_string())].into_iter().collect());

        let response = handler
            .call(&mut ctx, Request::new(Bytes::new()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_handler_fn_returns_error() {
        let handler = handler_fn(|_ctx, _req| {
            Box::pin(async { Err(moneyflow_core::ApiError::not_found("nope")) })
        });
        let mut ctx = RequestContext::new(Method::GET, "/");
        let err = handler
            .call(&mut ctx, Request::new(Bytes::new()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
    }
}
