//! `/v1/users` handlers.

use std::sync::Arc;

use chrono::Duration;
use http::{header, StatusCode};
use moneyflow_auth::{parse_basic, Authenticator, FORBIDDEN_MESSAGE};
use moneyflow_business::{NewUser, UpdateUser, UserCore, AUTH_FAILED_MESSAGE};
use moneyflow_core::{roles, ApiError, Claims, RequestContext};
use moneyflow_middleware::{BoxFuture, HandlerResult, Request, Response, ResponseExt};
use moneyflow_store::Transactor;
use serde::Serialize;

use crate::request::{decode, paging, param, require_owner_or_admin};

/// Body of a successful `GET /users/token`.
#[derive(Debug, Serialize)]
struct TokenBody {
    token: String,
}

/// User routes.
#[derive(Debug)]
pub struct UserHandlers<T: Transactor> {
    core: UserCore<T>,
    authenticator: Arc<Authenticator>,
    token_ttl: Duration,
}

impl<T: Transactor> UserHandlers<T> {
    /// Creates the group on `core`. Tokens it issues are signed by
    /// `authenticator` and live for `token_ttl`.
    pub fn new(core: UserCore<T>, authenticator: Arc<Authenticator>, token_ttl: Duration) -> Self {
        Self {
            core,
            authenticator,
            token_ttl,
        }
    }

    fn core(&self, ctx: &RequestContext) -> UserCore<T> {
        self.core.with_cancellation(ctx.cancellation().clone())
    }

    /// `GET /users/token`
    ///
    /// Exchanges basic-auth email and password for a signed token carrying
    /// the user's roles.
    pub fn token<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let (email, password) = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| parse_basic(value).ok())
                .ok_or_else(|| ApiError::unauthorized(AUTH_FAILED_MESSAGE))?;

            let user = self.core(ctx).authenticate(&email, &password).await?;
            let claims = Claims::new(
                &user.id,
                self.authenticator.issuer(),
                user.roles,
                ctx.now(),
                self.token_ttl,
            );
            let token = self
                .authenticator
                .generate_token(&claims)
                .map_err(|err| ApiError::internal_with_source("signing token", err))?;

            tracing::debug!(user_id = %user.id, "token issued");
            Ok(Response::json(StatusCode::OK, &TokenBody { token }))
        })
    }

    /// `GET /users/:page/:rows`
    pub fn query<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let (page, rows) = paging(ctx)?;
            let users = self.core(ctx).query(page, rows).await?;
            Ok(Response::json(StatusCode::OK, &users))
        })
    }

    /// `GET /users/:id`
    pub fn query_by_id<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let id = param(ctx, "id")?;
            require_owner_or_admin(ctx, id)?;
            let user = self.core(ctx).query_by_id(id).await?;
            Ok(Response::json(StatusCode::OK, &user))
        })
    }

    /// `POST /users`
    pub fn create<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let nu: NewUser = decode(&request)?;
            let user = self.core(ctx).create(nu, ctx.now()).await?;
            Ok(Response::json(StatusCode::CREATED, &user))
        })
    }

    /// `PUT /users/:id`
    ///
    /// Owners may edit their own name and email; only admins change roles.
    pub fn update<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let id = param(ctx, "id")?;
            require_owner_or_admin(ctx, id)?;

            let uu: UpdateUser = decode(&request)?;
            if uu.roles.is_some() && !ctx.require_claims()?.has_role(roles::ADMIN) {
                return Err(ApiError::forbidden(FORBIDDEN_MESSAGE));
            }

            self.core(ctx).update(id, uu, ctx.now()).await?;
            Ok(Response::no_content())
        })
    }

    /// `DELETE /users/:id`
    pub fn delete<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let id = param(ctx, "id")?;
            require_owner_or_admin(ctx, id)?;
            self.core(ctx).delete(id).await?;
            Ok(Response::no_content())
        })
    }
}
