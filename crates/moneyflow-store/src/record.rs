//! Typed CRUD over one table.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{StoreError, StoreResult};
use crate::scope::Scope;
use crate::transactor::{Executor, Query, Transactor};

/// A storage-layer row type.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table the records live in.
    const TABLE: &'static str;

    /// Primary key.
    fn id(&self) -> &str;
}

/// CRUD operations for records of type `R`.
///
/// Every method runs inside [`Scope::within_transaction`], so a store
/// obtained through [`RecordStore::with_scope`] from inside a transaction
/// joins it instead of opening another.
///
/// ```
/// # tokio_test::block_on(async {
/// use std::sync::Arc;
/// use moneyflow_store::{MemoryDb, Record, RecordStore};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize, PartialEq)]
/// struct Note { id: String, text: String }
///
/// impl Record for Note {
///     const TABLE: &'static str = "notes";
///     fn id(&self) -> &str { &self.id }
/// }
///
/// let store: RecordStore<MemoryDb, Note> = RecordStore::new(Arc::new(MemoryDb::new()));
/// let note = Note { id: "n1".into(), text: "hi".into() };
/// store.create(&note).await.unwrap();
/// assert_eq!(store.query_by_id("n1").await.unwrap(), note);
/// # });
/// ```
pub struct RecordStore<T: Transactor, R> {
    scope: Scope<T>,
    _record: PhantomData<fn() -> R>,
}

impl<T: Transactor, R> Clone for RecordStore<T, R> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Transactor, R> std::fmt::Debug for RecordStore<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("scope", &self.scope)
            .finish()
    }
}

impl<T: Transactor, R: Record> RecordStore<T, R> {
    /// A store on the transactor's autocommit handle.
    pub fn new(transactor: Arc<T>) -> Self {
        Self::from_scope(Scope::new(transactor))
    }

    /// A store bound to `scope`.
    pub fn from_scope(scope: Scope<T>) -> Self {
        Self {
            scope,
            _record: PhantomData,
        }
    }

    /// The same store running on `scope`, typically one handed out by
    /// [`Scope::within_transaction`].
    #[must_use]
    pub fn with_scope(&self, scope: Scope<T>) -> Self {
        Self::from_scope(scope)
    }

    /// The same store, cancelled along with `token`.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self::from_scope(self.scope.clone().with_cancellation(token))
    }

    /// The scope statements run in.
    pub fn scope(&self) -> &Scope<T> {
        &self.scope
    }

    /// Inserts `record`.
    pub async fn create(&self, record: &R) -> StoreResult<()> {
        let row = serde_json::to_value(record)?;
        self.scope
            .within_transaction(|scope| async move {
                scope.ensure_active()?;
                scope.handle().insert(R::TABLE, record.id(), row).await
            })
            .await
    }

    /// Replaces the stored record with the same id.
    pub async fn update(&self, record: &R) -> StoreResult<()> {
        let row = serde_json::to_value(record)?;
        self.scope
            .within_transaction(|scope| async move {
                scope.ensure_active()?;
                match scope.handle().update(R::TABLE, record.id(), row).await? {
                    0 => Err(StoreError::NotFound),
                    _ => Ok(()),
                }
            })
            .await
    }

    /// Deletes the record with `id`. Deleting an absent record succeeds.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.scope
            .within_transaction(|scope| async move {
                scope.ensure_active()?;
                scope.handle().delete(R::TABLE, id).await.map(|_| ())
            })
            .await
    }

    /// Returns one page of records in creation order.
    pub async fn query(&self, offset: usize, rows: usize) -> StoreResult<Vec<R>> {
        self.fetch_all(Query::table(R::TABLE).page(offset, rows))
            .await
    }

    /// Returns the record with `id`, or [`StoreError::NotFound`].
    pub async fn query_by_id(&self, id: &str) -> StoreResult<R> {
        let row = self
            .scope
            .within_transaction(|scope| async move {
                scope.ensure_active()?;
                scope.handle().fetch_by_id(R::TABLE, id).await
            })
            .await?;
        decode(row.ok_or(StoreError::NotFound)?)
    }

    /// Returns every record whose `field` equals `value`.
    pub async fn query_by_field(&self, field: &str, value: &str) -> StoreResult<Vec<R>> {
        self.fetch_all(Query::table(R::TABLE).filter_eq(field, value))
            .await
    }

    async fn fetch_all(&self, query: Query) -> StoreResult<Vec<R>> {
        let rows = self
            .scope
            .within_transaction(|scope| async move {
                scope.ensure_active()?;
                scope.handle().fetch_all(&query).await
            })
            .await?;
        rows.into_iter().map(decode).collect()
    }
}

fn decode<R: Record>(row: Value) -> StoreResult<R> {
    Ok(serde_json::from_value(row)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDb;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        owner: String,
        value: i64,
    }

    impl Record for Row {
        const TABLE: &'static str = "rows";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn row(id: &str, owner: &str, value: i64) -> Row {
        Row {
            id: id.into(),
            owner: owner.into(),
            value,
        }
    }

    fn store() -> (MemoryDb, RecordStore<MemoryDb, Row>) {
        let db = MemoryDb::new();
        (db.clone(), RecordStore::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn test_crud() {
        let (_, store) = store();
        store.create(&row("1", "a", 10)).await.unwrap();
        store.create(&row("2", "b", 20)).await.unwrap();

        let mut updated = store.query_by_id("1").await.unwrap();
        updated.value = 11;
        store.update(&updated).await.unwrap();
        assert_eq!(store.query_by_id("1").await.unwrap().value, 11);

        store.delete("1").await.unwrap();
        store.delete("1").await.unwrap();
        assert!(matches!(
            store.query_by_id("1").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.update(&row("1", "a", 0)).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_query_pages_and_filters() {
        let (_, store) = store();
        for (id, owner) in [("1", "a"), ("2", "b"), ("3", "a"), ("4", "a")] {
            store.create(&row(id, owner, 0)).await.unwrap();
        }

        let page: Vec<_> = store.query(2, 2).await.unwrap();
        assert_eq!(page.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["3", "4"]);

        let owned = store.query_by_field("owner", "a").await.unwrap();
        assert_eq!(owned.len(), 3);
        assert!(store.query_by_field("owner", "zz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_scope_joins_outer_transaction() {
        let (db, store) = store();

        let result: StoreResult<()> = store
            .scope()
            .within_transaction(|scope| {
                let tx = store.with_scope(scope);
                async move {
                    tx.create(&row("1", "a", 0)).await?;
                    assert_eq!(tx.query_by_id("1").await?.owner, "a");
                    tx.create(&row("2", "a", 0)).await?;
                    Err(StoreError::Backend("abort".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(db.stats().begun, 1);
        assert!(store.query(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_store_refuses_work() {
        let (db, store) = store();
        let token = CancellationToken::new();
        let store = store.with_cancellation(token.clone());
        token.cancel();

        assert!(matches!(
            store.create(&row("1", "a", 0)).await,
            Err(StoreError::Cancelled)
        ));
        assert_eq!(db.stats().begun, 0);
    }
}
