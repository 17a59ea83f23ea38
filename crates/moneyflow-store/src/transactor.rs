//! The storage seam: handles that execute queries and a transactor that
//! opens, commits and rolls back transactions on them.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;

/// A query against one table: equality filters plus an optional page.
///
/// ```
/// use moneyflow_store::Query;
///
/// let q = Query::table("incomes").filter_eq("user_id", "u-1").page(20, 10);
/// assert_eq!(q.table_name(), "incomes");
/// assert_eq!(q.offset(), 20);
/// assert_eq!(q.limit(), Some(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    filters: Vec<(String, Value)>,
    offset: usize,
    limit: Option<usize>,
}

impl Query {
    /// Selects every row of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    /// Keeps rows whose `field` equals `value`.
    #[must_use]
    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Skips `offset` rows and returns at most `limit`.
    #[must_use]
    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Equality filters.
    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    /// Rows to skip.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Maximum rows to return.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns `true` if `row` passes every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| row.get(field) == Some(value))
    }
}

/// Executes statements against a storage handle.
///
/// A handle is either the shared autocommit handle or one open
/// transaction; callers cannot tell which.
#[async_trait]
pub trait Executor: Clone + Send + Sync + 'static {
    /// Inserts a row. Fails with `Duplicate` if `id` exists.
    async fn insert(&self, table: &str, id: &str, row: Value) -> StoreResult<()>;

    /// Replaces a row, returning the number of rows affected.
    async fn update(&self, table: &str, id: &str, row: Value) -> StoreResult<u64>;

    /// Deletes a row, returning the number of rows affected.
    async fn delete(&self, table: &str, id: &str) -> StoreResult<u64>;

    /// Returns the row with `id`, if any.
    async fn fetch_by_id(&self, table: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Returns the matching rows in insertion order.
    async fn fetch_all(&self, query: &Query) -> StoreResult<Vec<Value>>;
}

/// Opens and closes transactions.
#[async_trait]
pub trait Transactor: Send + Sync + 'static {
    /// Handle type used both outside and inside transactions.
    type Handle: Executor;

    /// The autocommit handle.
    fn handle(&self) -> Self::Handle;

    /// Opens a transaction.
    async fn begin(&self) -> StoreResult<Self::Handle>;

    /// Makes the transaction's writes visible. The handle is closed afterwards.
    async fn commit(&self, tx: &Self::Handle) -> StoreResult<()>;

    /// Discards the transaction's writes. The handle is closed afterwards.
    async fn rollback(&self, tx: &Self::Handle) -> StoreResult<()>;
}
