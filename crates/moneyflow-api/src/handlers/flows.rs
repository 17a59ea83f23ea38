//! `/v1/incomes` and `/v1/expenses` handlers.
//!
//! Ownership of an existing record is decided by its stored `user_id`.
//! Updates and deletes check it inside the transaction that writes.

use http::StatusCode;
use moneyflow_business::{FlowCore, FlowKind, NewFlow, UpdateFlow};
use moneyflow_core::RequestContext;
use moneyflow_middleware::{BoxFuture, HandlerResult, Request, Response, ResponseExt};
use moneyflow_store::Transactor;

use crate::request::{decode, owner_or_admin, paging, param, require_owner_or_admin};

/// Income or expense routes, depending on `K`.
#[derive(Debug)]
pub struct FlowHandlers<T: Transactor, K: FlowKind> {
    core: FlowCore<T, K>,
}

impl<T: Transactor, K: FlowKind> FlowHandlers<T, K> {
    /// Creates the group on `core`.
    pub fn new(core: FlowCore<T, K>) -> Self {
        Self { core }
    }

    fn core(&self, ctx: &RequestContext) -> FlowCore<T, K> {
        self.core.with_cancellation(ctx.cancellation().clone())
    }

    /// `GET /<flows>/:page/:rows`
    pub fn query<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let (page, rows) = paging(ctx)?;
            let flows = self.core(ctx).query(page, rows).await?;
            Ok(Response::json(StatusCode::OK, &flows))
        })
    }

    /// `GET /<flows>/:id`
    pub fn query_by_id<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let id = param(ctx, "id")?;
            let flow = self.core(ctx).query_by_id(id).await?;
            require_owner_or_admin(ctx, &flow.user_id)?;
            Ok(Response::json(StatusCode::OK, &flow))
        })
    }

    /// `GET /<flows>/user/:user_id`
    pub fn query_by_user_id<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let user_id = param(ctx, "user_id")?;
            require_owner_or_admin(ctx, user_id)?;
            let flows = self.core(ctx).query_by_user_id(user_id).await?;
            Ok(Response::json(StatusCode::OK, &flows))
        })
    }

    /// `POST /<flows>`
    pub fn create<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let nf: NewFlow = decode(&request)?;
            require_owner_or_admin(ctx, &nf.user_id)?;
            let flow = self.core(ctx).create(nf, ctx.now()).await?;
            Ok(Response::json(StatusCode::CREATED, &flow))
        })
    }

    /// `PUT /<flows>/:id`
    pub fn update<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let id = param(ctx, "id")?;
            let uf: UpdateFlow = decode(&request)?;
            let claims = ctx.require_claims()?;

            self.core(ctx)
                .update_checked(id, uf, ctx.now(), |owner| owner_or_admin(claims, owner))
                .await?;
            Ok(Response::no_content())
        })
    }

    /// `DELETE /<flows>/:id`
    ///
    /// Deleting a record that does not exist succeeds.
    pub fn delete<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let id = param(ctx, "id")?;
            let claims = ctx.require_claims()?;

            self.core(ctx)
                .delete_checked(id, |owner| owner_or_admin(claims, owner))
                .await?;
            Ok(Response::no_content())
        })
    }
}
