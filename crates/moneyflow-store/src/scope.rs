//! Store scopes: the unit of atomicity around one storage handle.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::{StoreError, StoreResult};
use crate::transactor::Transactor;

/// A storage handle plus the "already inside a transaction" flag.
///
/// Only the outermost [`within_transaction`](Scope::within_transaction)
/// opens a physical transaction. The scope it hands to its closure is
/// flagged, so nested calls run directly on the same handle and their
/// writes are committed or rolled back by the outer call.
pub struct Scope<T: Transactor> {
    transactor: Arc<T>,
    handle: T::Handle,
    within_tran: bool,
    cancel: Option<CancellationToken>,
}

impl<T: Transactor> Clone for Scope<T> {
    fn clone(&self) -> Self {
        Self {
            transactor: Arc::clone(&self.transactor),
            handle: self.handle.clone(),
            within_tran: self.within_tran,
            cancel: self.cancel.clone(),
        }
    }
}

impl<T: Transactor> std::fmt::Debug for Scope<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("within_tran", &self.within_tran)
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

enum Outcome<R> {
    Finished(R),
    Panicked(Box<dyn Any + Send>),
    Cancelled,
}

impl<T: Transactor> Scope<T> {
    /// A top-level scope on the autocommit handle.
    pub fn new(transactor: Arc<T>) -> Self {
        let handle = transactor.handle();
        Self {
            transactor,
            handle,
            within_tran: false,
            cancel: None,
        }
    }

    /// Ties the scope to a request's cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The handle statements run on.
    pub fn handle(&self) -> &T::Handle {
        &self.handle
    }

    /// Returns `true` inside a transaction opened by an outer scope.
    pub fn is_within_transaction(&self) -> bool {
        self.within_tran
    }

    /// Returns `true` once the caller has gone away.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Fails with [`StoreError::Cancelled`] once the caller has gone away.
    pub fn ensure_active(&self) -> StoreResult<()> {
        if self.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Runs `f` atomically.
    ///
    /// Inside an existing transaction `f` runs directly on the current
    /// handle. Otherwise a transaction is opened, `f` runs on it, and the
    /// transaction commits if `f` returns `Ok` and rolls back if `f`
    /// returns an error or panics, if the scope is cancelled first, or if
    /// the returned future is dropped before it settles. The error from
    /// `f` is returned unchanged.
    pub async fn within_transaction<F, Fut, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(Scope<T>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<StoreError>,
    {
        if self.within_tran {
            return f(self.clone()).await;
        }

        self.ensure_active()?;
        let tx = self.transactor.begin().await?;
        let mut pending = RollbackOnDrop {
            transactor: Arc::clone(&self.transactor),
            tx: Some(tx.clone()),
        };
        let inner = Self {
            transactor: Arc::clone(&self.transactor),
            handle: tx.clone(),
            within_tran: true,
            cancel: self.cancel.clone(),
        };

        let work = AssertUnwindSafe(f(inner)).catch_unwind();
        let outcome = match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Outcome::Cancelled,
                result = work => result.map_or_else(Outcome::Panicked, Outcome::Finished),
            },
            None => work
                .await
                .map_or_else(Outcome::Panicked, Outcome::Finished),
        };

        pending.disarm();

        match outcome {
            Outcome::Finished(Ok(value)) => {
                self.transactor.commit(&tx).await?;
                Ok(value)
            }
            Outcome::Finished(Err(err)) => {
                rollback(self.transactor.as_ref(), &tx, "error").await;
                Err(err)
            }
            Outcome::Panicked(payload) => {
                rollback(self.transactor.as_ref(), &tx, "panic").await;
                Err(StoreError::Panicked(panic_message(payload.as_ref())).into())
            }
            Outcome::Cancelled => {
                rollback(self.transactor.as_ref(), &tx, "cancelled").await;
                Err(StoreError::Cancelled.into())
            }
        }
    }
}

async fn rollback<T: Transactor>(transactor: &T, tx: &T::Handle, reason: &'static str) {
    tracing::debug!(reason, "rolling back transaction");
    if let Err(err) = transactor.rollback(tx).await {
        tracing::error!(reason, error = %err, "rollback failed");
    }
}

/// Rolls the transaction back if the future driving
/// [`Scope::within_transaction`] is dropped before it settles, as happens
/// when a request deadline or a client disconnect drops the handler.
struct RollbackOnDrop<T: Transactor> {
    transactor: Arc<T>,
    tx: Option<T::Handle>,
}

impl<T: Transactor> RollbackOnDrop<T> {
    fn disarm(&mut self) {
        self.tx = None;
    }
}

impl<T: Transactor> Drop for RollbackOnDrop<T> {
    fn drop(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("transaction dropped outside a runtime, leaving it to the backend");
            return;
        };
        let transactor = Arc::clone(&self.transactor);
        runtime.spawn(async move {
            rollback(transactor.as_ref(), &tx, "dropped").await;
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&'static str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
