//! Bearer token authentication.

use std::sync::Arc;

use http::header::AUTHORIZATION;
use moneyflow_auth::{AuthError, Authenticator};
use moneyflow_core::{ApiError, RequestContext};

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{HandlerResult, Request};

/// Verifies the `Authorization: Bearer <token>` header and stores the
/// claims in the request context.
///
/// Any failure (missing header, wrong scheme, bad signature, unknown key,
/// expired claims) yields the same forbidden error and the rest of the
/// chain does not run.
#[derive(Debug, Clone)]
pub struct AuthenticateMiddleware {
    authenticator: Arc<Authenticator>,
}

impl AuthenticateMiddleware {
    /// Creates the interceptor around a shared authenticator.
    #[must_use]
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl Middleware for AuthenticateMiddleware {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let verified = request
                .headers()
                .get(AUTHORIZATION)
                .ok_or(AuthError::MalformedHeader)
                .and_then(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
                .and_then(|value| self.authenticator.authenticate_header(value));

            match verified {
                Ok(claims) => {
                    ctx.set_claims(claims);
                    next.run(ctx, request).await
                }
                Err(err) => {
                    tracing::debug!(trace_id = %ctx.trace_id(), error = %err, "authentication failed");
                    Err(ApiError::from(err))
                }
            }
        })
    }
}
