//! In-memory transactional backend.
//!
//! Tables are insertion-ordered maps of JSON rows behind one `RwLock`. A
//! transaction buffers its writes in a private log; reads through the
//! transaction see the committed tables with that log replayed on top.
//! Commit replays the log against a copy of the affected tables under the
//! write lock and swaps them in only if every statement applied, so a
//! commit is all-or-nothing.
//!
//! Concurrent transactions are not isolated from each other's commits:
//! the last commit to touch a row wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::transactor::{Executor, Query, Transactor};

type Table = IndexMap<String, Value>;

#[derive(Debug, Clone)]
enum Write {
    Insert { table: String, id: String, row: Value },
    Update { table: String, id: String, row: Value },
    Delete { table: String, id: String },
}

impl Write {
    fn table(&self) -> &str {
        match self {
            Self::Insert { table, .. } | Self::Update { table, .. } | Self::Delete { table, .. } => {
                table
            }
        }
    }

    /// Applies the write, returning the rows affected.
    fn apply(&self, tables: &mut HashMap<String, Table>) -> StoreResult<u64> {
        match self {
            Self::Insert { table, id, row } => {
                let rows = tables.entry(table.clone()).or_default();
                if rows.contains_key(id) {
                    return Err(StoreError::Duplicate {
                        table: table.clone(),
                        id: id.clone(),
                    });
                }
                rows.insert(id.clone(), row.clone());
                Ok(1)
            }
            Self::Update { table, id, row } => {
                match tables.get_mut(table).and_then(|rows| rows.get_mut(id)) {
                    Some(existing) => {
                        *existing = row.clone();
                        Ok(1)
                    }
                    None => Ok(0),
                }
            }
            Self::Delete { table, id } => Ok(tables
                .get_mut(table)
                .and_then(|rows| rows.shift_remove(id))
                .map_or(0, |_| 1)),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
}

#[derive(Debug, Default)]
struct Shared {
    tables: RwLock<HashMap<String, Table>>,
    counters: Counters,
}

#[derive(Debug, Default)]
struct TxState {
    writes: Mutex<Vec<Write>>,
    closed: AtomicBool,
}

/// Transaction counters, for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxStats {
    /// Transactions opened.
    pub begun: u64,
    /// Transactions committed.
    pub committed: u64,
    /// Transactions rolled back.
    pub rolled_back: u64,
}

/// An in-memory database. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryDb {
    shared: Arc<Shared>,
}

impl MemoryDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction counters so far.
    pub fn stats(&self) -> TxStats {
        let c = &self.shared.counters;
        TxStats {
            begun: c.begun.load(Ordering::SeqCst),
            committed: c.committed.load(Ordering::SeqCst),
            rolled_back: c.rolled_back.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl Transactor for MemoryDb {
    type Handle = MemoryHandle;

    fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            shared: Arc::clone(&self.shared),
            tx: None,
        }
    }

    async fn begin(&self) -> StoreResult<MemoryHandle> {
        self.shared.counters.begun.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryHandle {
            shared: Arc::clone(&self.shared),
            tx: Some(Arc::new(TxState::default())),
        })
    }

    async fn commit(&self, tx: &MemoryHandle) -> StoreResult<()> {
        let state = tx.open_tx()?;
        state.closed.store(true, Ordering::SeqCst);
        let writes = std::mem::take(&mut *state.writes.lock());

        let mut tables = self.shared.tables.write();
        let mut staged: HashMap<String, Table> = HashMap::new();
        for write in &writes {
            if !staged.contains_key(write.table()) {
                let current = tables.get(write.table()).cloned().unwrap_or_default();
                staged.insert(write.table().to_string(), current);
            }
        }
        if let Err(err) = writes.iter().try_for_each(|w| w.apply(&mut staged).map(|_| ())) {
            self.shared.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
            return Err(err);
        }
        tables.extend(staged);

        self.shared.counters.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self, tx: &MemoryHandle) -> StoreResult<()> {
        let state = tx.open_tx()?;
        state.closed.store(true, Ordering::SeqCst);
        state.writes.lock().clear();
        self.shared.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A handle on [`MemoryDb`]: autocommit, or one open transaction.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    shared: Arc<Shared>,
    tx: Option<Arc<TxState>>,
}

impl MemoryHandle {
    fn open_tx(&self) -> StoreResult<&TxState> {
        match &self.tx {
            Some(state) if !state.closed.load(Ordering::SeqCst) => Ok(state),
            Some(_) => Err(StoreError::TransactionClosed),
            None => Err(StoreError::Backend("not a transaction handle".into())),
        }
    }

    /// Runs a write: directly when autocommit, buffered in a transaction.
    fn write(&self, write: Write) -> StoreResult<u64> {
        match &self.tx {
            None => write.apply(&mut *self.shared.tables.write()),
            Some(_) => {
                let state = self.open_tx()?;
                let mut view = self.view(write.table())?;
                let affected = write.apply(&mut view)?;
                state.writes.lock().push(write);
                Ok(affected)
            }
        }
    }

    /// `table` as this handle sees it.
    fn view(&self, table: &str) -> StoreResult<HashMap<String, Table>> {
        let mut view = HashMap::new();
        view.insert(
            table.to_string(),
            self.shared.tables.read().get(table).cloned().unwrap_or_default(),
        );
        if let Some(state) = &self.tx {
            if state.closed.load(Ordering::SeqCst) {
                return Err(StoreError::TransactionClosed);
            }
            for write in state.writes.lock().iter().filter(|w| w.table() == table) {
                write.apply(&mut view)?;
            }
        }
        Ok(view)
    }
}

#[async_trait]
impl Executor for MemoryHandle {
    async fn insert(&self, table: &str, id: &str, row: Value) -> StoreResult<()> {
        self.write(Write::Insert {
            table: table.to_string(),
            id: id.to_string(),
            row,
        })
        .map(|_| ())
    }

    async fn update(&self, table: &str, id: &str, row: Value) -> StoreResult<u64> {
        self.write(Write::Update {
            table: table.to_string(),
            id: id.to_string(),
            row,
        })
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<u64> {
        self.write(Write::Delete {
            table: table.to_string(),
            id: id.to_string(),
        })
    }

    async fn fetch_by_id(&self, table: &str, id: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .view(table)?
            .get(table)
            .and_then(|rows| rows.get(id))
            .cloned())
    }

    async fn fetch_all(&self, query: &Query) -> StoreResult<Vec<Value>> {
        let view = self.view(query.table_name())?;
        let Some(rows) = view.get(query.table_name()) else {
            return Ok(Vec::new());
        };
        let matching = rows
            .values()
            .filter(|row| query.matches(row))
            .skip(query.offset())
            .cloned();
        Ok(match query.limit() {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }
}
