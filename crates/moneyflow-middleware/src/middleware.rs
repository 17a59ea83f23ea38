//! The interceptor trait.
//!
//! An interceptor receives the request context, the request and a [`Next`]
//! continuation. It may inspect or modify the context, call `next.run()`
//! once, inspect the outcome, or return early without calling it.
//!
//! # Example
//!
//! ```
//! use moneyflow_core::RequestContext;
//! use moneyflow_middleware::{BoxFuture, HandlerResult, Middleware, Next, Request};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, HandlerResult> {
//!         Box::pin(async move {
//!             let result = next.run(ctx, request).await;
//!             println!("{} took {:?}", ctx.path(), ctx.elapsed());
//!             result
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use moneyflow_core::RequestContext;

use crate::handler::Handler;
use crate::types::{HandlerResult, Request};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A request interceptor.
///
/// # Invariants
///
/// - Calls `next.run()` at most once
/// - Never turns an error into success unless that is its purpose
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs and chain listings.
    fn name(&self) -> &'static str;

    /// Processes the request, usually by delegating to `next`.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// The rest of the chain, as seen from one interceptor.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Creates a continuation into `handler`.
    pub fn new(handler: &'a dyn Handler) -> Self {
        Self { handler }
    }

    /// Runs the remainder of the chain.
    ///
    /// The context is reborrowed for the call only, so the interceptor can
    /// keep using it after the inner result is available.
    pub fn run<'b>(self, ctx: &'b mut RequestContext, request: Request) -> BoxFuture<'b, HandlerResult>
    where
        'a: 'b,
    {
        self.handler.call(ctx, request)
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}
