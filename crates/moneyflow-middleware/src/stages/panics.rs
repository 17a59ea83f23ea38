//! Panic recovery.
//!
//! A panic anywhere further in the chain is caught and turned into an
//! internal error, so one faulty handler cannot take the connection task
//! down with it.
//!
//! The first `PanicsMiddleware` constructed installs a process-wide panic
//! hook that records the backtrace at the panic site in a thread local.
//! `catch_unwind` observes the unwind on the same thread, so the
//! interceptor can log the backtrace of the actual fault rather than that
//! of the recovery point.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::Once;

use futures_util::FutureExt;
use moneyflow_core::{ApiError, RequestContext};

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{HandlerResult, Request};

thread_local! {
    static LAST_PANIC: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

fn take_backtrace() -> Backtrace {
    LAST_PANIC
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(Backtrace::force_capture)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

/// Converts panics into internal errors.
#[derive(Debug, Clone, Copy)]
pub struct PanicsMiddleware;

impl PanicsMiddleware {
    /// Creates the panic interceptor.
    #[must_use]
    pub fn new() -> Self {
        install_hook();
        Self
    }
}

impl Default for PanicsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for PanicsMiddleware {
    fn name(&self) -> &'static str {
        "panics"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            match AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    let backtrace = take_backtrace();
                    tracing::error!(
                        trace_id = %ctx.trace_id(),
                        path = %ctx.path(),
                        panic = %message,
                        backtrace = %backtrace,
                        "handler panicked"
                    );
                    Err(ApiError::internal(format!("PANIC [{message}]")))
                }
            }
        })
    }
}
