//! Postgres backend.
//!
//! Every record table has the same shape: a text primary key, a
//! `BIGSERIAL` sequence giving creation order, and the record itself as
//! `JSONB`. Equality filters become a single `@>` containment test on the
//! body.
//!
//! ## Error mapping
//!
//! | sqlx error | code | `StoreError` |
//! |------------|------|--------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | RowNotFound | n/a | `NotFound` |
//! | anything else | n/a | `Backend` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::transactor::{Executor, Query, Transactor};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;
type OpenTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// A [`Transactor`] on a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgTransactor {
    pool: PgPool,
}

impl PgTransactor {
    /// Wraps an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool on `url`.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error(e, "", ""))?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates any of `tables` that do not exist yet.
    pub async fn migrate(&self, tables: &[&str]) -> StoreResult<()> {
        for table in tables {
            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 id TEXT PRIMARY KEY, \
                 seq BIGSERIAL NOT NULL, \
                 body JSONB NOT NULL)",
                table_ident(table)?
            );
            sqlx::query(&sql)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, table, ""))?;
            tracing::debug!(table, "table ready");
        }
        Ok(())
    }
}

#[async_trait]
impl Transactor for PgTransactor {
    type Handle = PgHandle;

    fn handle(&self) -> PgHandle {
        PgHandle {
            pool: self.pool.clone(),
            tx: None,
        }
    }

    async fn begin(&self) -> StoreResult<PgHandle> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, "", ""))?;
        Ok(PgHandle {
            pool: self.pool.clone(),
            tx: Some(Arc::new(Mutex::new(Some(tx)))),
        })
    }

    async fn commit(&self, tx: &PgHandle) -> StoreResult<()> {
        tx.take()
            .await?
            .commit()
            .await
            .map_err(|e| map_sqlx_error(e, "", ""))
    }

    async fn rollback(&self, tx: &PgHandle) -> StoreResult<()> {
        tx.take()
            .await?
            .rollback()
            .await
            .map_err(|e| map_sqlx_error(e, "", ""))
    }
}

/// A handle on [`PgTransactor`]: the pool, or one open transaction.
#[derive(Clone)]
pub struct PgHandle {
    pool: PgPool,
    tx: Option<OpenTx>,
}

impl std::fmt::Debug for PgHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgHandle")
            .field("transaction", &self.tx.is_some())
            .finish_non_exhaustive()
    }
}

impl PgHandle {
    async fn take(&self) -> StoreResult<Transaction<'static, Postgres>> {
        match &self.tx {
            Some(tx) => tx.lock().await.take().ok_or(StoreError::TransactionClosed),
            None => Err(StoreError::Backend("not a transaction handle".into())),
        }
    }

    async fn execute(&self, query: PgQuery<'_>, table: &str, id: &str) -> StoreResult<u64> {
        let result = match &self.tx {
            None => query.execute(&self.pool).await,
            Some(tx) => {
                let mut open = tx.lock().await;
                let conn = open.as_mut().ok_or(StoreError::TransactionClosed)?;
                query.execute(&mut **conn).await
            }
        };
        result
            .map(|done| done.rows_affected())
            .map_err(|e| map_sqlx_error(e, table, id))
    }

    async fn fetch(&self, query: PgQuery<'_>, table: &str) -> StoreResult<Vec<Value>> {
        let rows: Vec<PgRow> = match &self.tx {
            None => query.fetch_all(&self.pool).await,
            Some(tx) => {
                let mut open = tx.lock().await;
                let conn = open.as_mut().ok_or(StoreError::TransactionClosed)?;
                query.fetch_all(&mut **conn).await
            }
        }
        .map_err(|e| map_sqlx_error(e, table, ""))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Value, _>("body")
                    .map_err(|e| map_sqlx_error(e, table, ""))
            })
            .collect()
    }
}

#[async_trait]
impl Executor for PgHandle {
    async fn insert(&self, table: &str, id: &str, row: Value) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, body) VALUES ($1, $2)",
            table_ident(table)?
        );
        self.execute(sqlx::query(&sql).bind(id).bind(row), table, id)
            .await
            .map(|_| ())
    }

    async fn update(&self, table: &str, id: &str, row: Value) -> StoreResult<u64> {
        let sql = format!("UPDATE {} SET body = $2 WHERE id = $1", table_ident(table)?);
        self.execute(sqlx::query(&sql).bind(id).bind(row), table, id)
            .await
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table_ident(table)?);
        self.execute(sqlx::query(&sql).bind(id), table, id).await
    }

    async fn fetch_by_id(&self, table: &str, id: &str) -> StoreResult<Option<Value>> {
        let sql = format!("SELECT body FROM {} WHERE id = $1", table_ident(table)?);
        Ok(self
            .fetch(sqlx::query(&sql).bind(id), table)
            .await?
            .into_iter()
            .next())
    }

    async fn fetch_all(&self, query: &Query) -> StoreResult<Vec<Value>> {
        let table = query.table_name();
        let sql = format!(
            "SELECT body FROM {} WHERE body @> $1 ORDER BY seq OFFSET $2 LIMIT $3",
            table_ident(table)?
        );
        let statement = sqlx::query(&sql)
            .bind(filter_document(query))
            .bind(to_i64(query.offset()))
            .bind(query.limit().map(to_i64));
        self.fetch(statement, table).await
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
fn table_ident(table: &str) -> StoreResult<&str> {
    let valid = table
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && table
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(table)
    } else {
        Err(StoreError::Backend(format!("invalid table name '{table}'")))
    }
}

/// The JSON object a row body must contain to pass every filter.
fn filter_document(query: &Query) -> Value {
    Value::Object(query.filters().iter().cloned().collect::<Map<_, _>>())
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn map_sqlx_error(err: sqlx::Error, table: &str, id: &str) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::Duplicate {
                table: table.to_string(),
                id: id.to_string(),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Backend(other.to_string()),
    }
}
