//! Error classification.
//!
//! Turns every [`ApiError`] returned from further in the chain into the
//! JSON error envelope and records the final status in the context.
//!
//! | Kind         | Status | Body                                   |
//! |--------------|--------|----------------------------------------|
//! | `Validation` | 400    | message, plus `fields` when present    |
//! | `InvalidId`  | 400    | message                                |
//! | `Unauthorized` | 401  | message                                |
//! | `NotFound`   | 404    | message                                |
//! | `Forbidden`  | 403    | message                                |
//! | `Internal`   | 500    | `"Internal Server Error"`              |
//! | `Shutdown`   | none   | propagated so the server can stop      |

use std::error::Error as _;

use http::StatusCode;
use moneyflow_core::{ApiError, RequestContext};

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{HandlerResult, Request, Response, ResponseExt};

/// Translates classified errors into client responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorsMiddleware;

impl ErrorsMiddleware {
    /// Creates the error classifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for ErrorsMiddleware {
    fn name(&self) -> &'static str {
        "errors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            // The status slot is write-once and the logging stage reads it.
            // Stages further in can still turn a response into an error, so
            // this stage is the only writer and must sit outside them.
            match next.run(ctx, request).await {
                Ok(response) => {
                    ctx.set_status(response.status());
                    Ok(response)
                }
                Err(err) if err.is_shutdown() => {
                    tracing::error!(
                        trace_id = %ctx.trace_id(),
                        error = %err,
                        "handler requested shutdown"
                    );
                    Err(err)
                }
                Err(err) => Ok(respond(ctx, &err)),
            }
        })
    }
}

fn respond(ctx: &mut RequestContext, err: &ApiError) -> Response {
    let status = err
        .status_code()
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if err.is_trusted() {
        tracing::info!(
            trace_id = %ctx.trace_id(),
            kind = err.kind().as_str(),
            error = %err,
            "request error"
        );
    } else {
        tracing::error!(
            trace_id = %ctx.trace_id(),
            error = %err,
            source = ?err.source(),
            "internal error"
        );
    }

    ctx.set_status(status);
    Response::envelope(status, &err.to_envelope())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use crate::handler::{handler_fn, Handler};
    use bytes::Bytes;
    use http::Method;
    use http_body_util::BodyExt;
    use moneyflow_core::{FieldErrors, INTERNAL_MESSAGE, VALIDATION_MESSAGE};
    use std::sync::Arc;

    fn failing(err: fn() -> ApiError) -> Arc<dyn Handler> {
        Chain::new()
            .with(ErrorsMiddleware::new())
            .wrap(Arc::new(handler_fn(move |_ctx, _req| {
                Box::pin(async move { Err(err()) })
            })))
    }

    async fn run(handler: &Arc<dyn Handler>) -> (RequestContext, HandlerResult) {
        let mut ctx = RequestContext::new(Method::GET, "/v1/test");
        let result = handler.call(&mut ctx, Request::new(Bytes::new())).await;
        (ctx, result)
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let handler = failing(|| {
            let mut fields = FieldErrors::new();
            fields.add("name", "name is a required field");
            ApiError::validation(fields)
        });
        let (ctx, result) = run(&handler).await;
        let response = result.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ctx.status(), Some(StatusCode::BAD_REQUEST));
        let body = json(response).await;
        assert_eq!(body["error"], VALIDATION_MESSAGE);
        assert_eq!(body["fields"][0]["field"], "name");
    }

    #[tokio::test]
    async fn test_not_found_and_forbidden() {
        let (_, result) = run(&failing(|| ApiError::not_found("not found"))).await;
        let response = result.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(json(response).await.get("fields").is_none());

        let (_, result) = run(&failing(|| ApiError::forbidden("no"))).await;
        assert_eq!(result.unwrap().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_internal_error_is_masked() {
        let (ctx, result) = run(&failing(|| {
            ApiError::internal("db password rejected for user root")
        }))
        .await;
        let response = result.unwrap();

        assert_eq!(ctx.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        let body = json(response).await;
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_shutdown_propagates() {
        let (ctx, result) = run(&failing(|| ApiError::shutdown("integrity lost"))).await;
        assert!(result.unwrap_err().is_shutdown());
        assert_eq!(ctx.status(), None);
    }

    #[tokio::test]
    async fn test_first_status_write_wins() {
        let handler = Chain::new()
            .with(ErrorsMiddleware::new())
            .wrap(Arc::new(handler_fn(|ctx, _req| {
                Box::pin(async move {
                    ctx.set_status(StatusCode::OK);
                    Err(ApiError::not_found("gone"))
                })
            })));
        let (ctx, result) = run(&handler).await;
        assert_eq!(result.unwrap().status(), StatusCode::NOT_FOUND);
        assert_eq!(ctx.status(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn test_success_records_status() {
        let handler = Chain::new()
            .with(ErrorsMiddleware::new())
            .wrap(Arc::new(handler_fn(|_ctx, _req| {
                Box::pin(async { Ok(Response::json(StatusCode::CREATED, &"made")) })
            })));
        let (ctx, result) = run(&handler).await;
        assert_eq!(result.unwrap().status(), StatusCode::CREATED);
        assert_eq!(ctx.status(), Some(StatusCode::CREATED));
    }
}
