//! Income and expense management.
//!
//! Incomes and expenses differ only in table and resource name, so one
//! core serves both, parameterised by a [`FlowKind`] marker.

mod db;
mod models;

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use moneyflow_core::generate_id;
use moneyflow_store::{RecordStore, StoreError, Transactor};
use tokio_util::sync::CancellationToken;

pub use models::{Flow, NewFlow, UpdateFlow};

use crate::check::{page_offset, parse_id, validate};
use crate::error::BusinessError;
use db::FlowRecord;

/// Selects the table and resource name of a flow core.
pub trait FlowKind: Send + Sync + 'static {
    /// Storage table.
    const TABLE: &'static str;
    /// Singular resource name used in messages.
    const RESOURCE: &'static str;
}

/// Income and expense business operations.
pub struct FlowCore<T: Transactor, K: FlowKind> {
    store: RecordStore<T, FlowRecord<K>>,
    kind: PhantomData<fn() -> K>,
}

impl<T: Transactor, K: FlowKind> Clone for FlowCore<T, K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            kind: PhantomData,
        }
    }
}

impl<T: Transactor, K: FlowKind> std::fmt::Debug for FlowCore<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowCore")
            .field("resource", &K::RESOURCE)
            .finish_non_exhaustive()
    }
}

impl<T: Transactor, K: FlowKind> FlowCore<T, K> {
    /// Creates the core on `transactor`.
    pub fn new(transactor: Arc<T>) -> Self {
        Self {
            store: RecordStore::new(transactor),
            kind: PhantomData,
        }
    }

    /// The same core, aborting store work once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            store: self.store.with_cancellation(token),
            kind: PhantomData,
        }
    }

    /// Adds a record and returns it with id and dates filled in.
    pub async fn create(&self, nf: NewFlow, now: DateTime<Utc>) -> Result<Flow, BusinessError> {
        validate(&nf)?;

        let record = FlowRecord {
            flow_id: generate_id(),
            user_id: nf.user_id,
            name: nf.name,
            category: nf.category,
            currency: nf.currency,
            amount: nf.amount,
            reoccurrence: nf.reoccurrence,
            duration: nf.duration,
            reoccurrence_type: nf.reoccurrence_type,
            duration_type: nf.duration_type,
            date_created: now,
            date_updated: now,
            kind: PhantomData,
        };
        self.store.create(&record).await?;

        Ok(record.into())
    }

    /// Modifies the record `id`. The read and the write share one
    /// transaction.
    pub async fn update(
        &self,
        id: &str,
        uf: UpdateFlow,
        now: DateTime<Utc>,
    ) -> Result<(), BusinessError> {
        self.update_checked(id, uf, now, |_| Ok(())).await
    }

    /// Modifies the record `id` if `check` accepts its stored owner.
    ///
    /// The read, the check and the write share one transaction, so the
    /// owner `check` saw is the owner of the record that gets written.
    pub async fn update_checked<F>(
        &self,
        id: &str,
        uf: UpdateFlow,
        now: DateTime<Utc>,
        check: F,
    ) -> Result<(), BusinessError>
    where
        F: FnOnce(&str) -> Result<(), BusinessError> + Send,
    {
        parse_id(id)?;
        validate(&uf)?;

        self.store
            .scope()
            .within_transaction(|scope| {
                let tx = self.store.with_scope(scope);
                async move {
                    let mut record = tx
                        .query_by_id(id)
                        .await
                        .map_err(BusinessError::missing(K::RESOURCE))?;
                    check(&record.user_id)?;
                    merge(&mut record, uf);
                    record.date_updated = now;
                    tx.update(&record)
                        .await
                        .map_err(BusinessError::missing(K::RESOURCE))
                }
            })
            .await
    }

    /// Removes the record `id`. Removing an absent record succeeds.
    pub async fn delete(&self, id: &str) -> Result<(), BusinessError> {
        parse_id(id)?;
        self.store.delete(id).await?;
        tracing::debug!(resource = K::RESOURCE, %id, "record deleted");
        Ok(())
    }

    /// Removes the record `id` if `check` accepts its stored owner.
    /// Removing an absent record succeeds without calling `check`.
    pub async fn delete_checked<F>(&self, id: &str, check: F) -> Result<(), BusinessError>
    where
        F: FnOnce(&str) -> Result<(), BusinessError> + Send,
    {
        parse_id(id)?;

        let deleted = self
            .store
            .scope()
            .within_transaction(|scope| {
                let tx = self.store.with_scope(scope);
                async move {
                    let record = match tx.query_by_id(id).await {
                        Ok(record) => record,
                        Err(StoreError::NotFound) => return Ok(false),
                        Err(err) => return Err(err.into()),
                    };
                    check(&record.user_id)?;
                    tx.delete(id).await?;
                    Ok::<_, BusinessError>(true)
                }
            })
            .await?;

        if deleted {
            tracing::debug!(resource = K::RESOURCE, %id, "record deleted");
        }
        Ok(())
    }

    /// Returns one page of records in creation order. Pages start at 1.
    pub async fn query(&self, page: usize, rows: usize) -> Result<Vec<Flow>, BusinessError> {
        let records = self.store.query(page_offset(page, rows), rows).await?;
        Ok(records.into_iter().map(Flow::from).collect())
    }

    /// Returns the record `id`.
    pub async fn query_by_id(&self, id: &str) -> Result<Flow, BusinessError> {
        parse_id(id)?;
        self.store
            .query_by_id(id)
            .await
            .map(Flow::from)
            .map_err(BusinessError::missing(K::RESOURCE))
    }

    /// Returns every record owned by `user_id`, possibly none.
    pub async fn query_by_user_id(&self, user_id: &str) -> Result<Vec<Flow>, BusinessError> {
        parse_id(user_id)?;
        let records = self.store.query_by_field("user_id", user_id).await?;
        Ok(records.into_iter().map(Flow::from).collect())
    }
}

fn merge<K>(record: &mut FlowRecord<K>, uf: UpdateFlow) {
    if let Some(name) = uf.name {
        record.name = name;
    }
    if let Some(category) = uf.category {
        record.category = category;
    }
    if let Some(currency) = uf.currency {
        record.currency = currency;
    }
    if let Some(amount) = uf.amount {
        record.amount = amount;
    }
    if let Some(reoccurrence) = uf.reoccurrence {
        record.reoccurrence = reoccurrence;
    }
    if let Some(duration) = uf.duration {
        record.duration = duration;
    }
    if let Some(reoccurrence_type) = uf.reoccurrence_type {
        record.reoccurrence_type = reoccurrence_type;
    }
    if let Some(duration_type) = uf.duration_type {
        record.duration_type = duration_type;
    }
}
