//! Role-based authorization.

use moneyflow_auth::FORBIDDEN_MESSAGE;
use moneyflow_core::{ApiError, RequestContext};

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{HandlerResult, Request};

/// Lets the request through only if the authenticated claims carry `role`.
///
/// Must run after [`AuthenticateMiddleware`](super::AuthenticateMiddleware);
/// a context without claims is a wiring mistake and yields an internal
/// error.
#[derive(Debug, Clone)]
pub struct AuthorizeMiddleware {
    role: String,
}

impl AuthorizeMiddleware {
    /// Requires `role`.
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }

    /// The required role.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }
}

impl Middleware for AuthorizeMiddleware {
    fn name(&self) -> &'static str {
        "authorize"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let Some(claims) = ctx.claims() else {
                return Err(ApiError::internal(
                    "authorize: claims missing from request context",
                ));
            };

            if !claims.has_role(&self.role) {
                tracing::debug!(
                    trace_id = %ctx.trace_id(),
                    subject = claims.subject(),
                    required = %self.role,
                    "role check failed"
                );
                return Err(ApiError::forbidden(FORBIDDEN_MESSAGE));
            }

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use crate::handler::{handler_fn, Handler};
    use crate::types::{Response, ResponseExt};
    use bytes::Bytes;
    use chrono::{Duration, Utc};
    use http::{Method, StatusCode};
    use moneyflow_core::{roles, Claims, ErrorKind};
    use std::sync::Arc;

    fn admin_only() -> Arc<dyn Handler> {
        Chain::new()
            .with(AuthorizeMiddleware::new(roles::ADMIN))
            .wrap(Arc::new(handler_fn(|_ctx, _req| {
                Box::pin(async { Ok(Response::no_content()) })
            })))
    }

    fn ctx_with(roles: &[&str]) -> RequestContext {
        let mut ctx = RequestContext::new(Method::GET, "/");
        ctx.set_claims(Claims::new(
            "user-1",
            "moneyflow",
            roles.iter().copied(),
            Utc::now(),
            Duration::hours(1),
        ));
        ctx
    }

    #[tokio::test]
    async fn test_role_present() {
        let mut ctx = ctx_with(&[roles::USER, roles::ADMIN]);
        let response = admin_only()
            .call(&mut ctx, Request::new(Bytes::new()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_role_absent_is_forbidden() {
        let mut ctx = ctx_with(&[roles::USER]);
        let err = admin_only()
            .call(&mut ctx, Request::new(Bytes::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_missing_claims_is_internal() {
        let mut ctx = RequestContext::new(Method::GET, "/");
        let err = admin_only()
            .call(&mut ctx, Request::new(Bytes::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
