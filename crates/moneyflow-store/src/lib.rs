//! # Moneyflow Store
//!
//! Transaction scoping for the moneyflow API.
//!
//! - [`Transactor`] / [`Executor`] - the seam to a storage backend
//! - [`Scope`] - a handle plus the "inside a transaction" flag; nested
//!   [`Scope::within_transaction`] calls share one physical transaction
//! - [`MemoryDb`] - the in-memory transactional backend
//! - [`PgTransactor`] - the Postgres backend
//! - [`RecordStore`] - typed CRUD over one table, every call scoped
//!
//! ```
//! # tokio_test::block_on(async {
//! use std::sync::Arc;
//! use moneyflow_store::{Executor, MemoryDb, Scope, StoreError};
//! use serde_json::json;
//!
//! let db = MemoryDb::new();
//! let scope = Scope::new(Arc::new(db.clone()));
//!
//! let result: Result<(), StoreError> = scope
//!     .within_transaction(|tx| async move {
//!         tx.handle().insert("t", "1", json!({})).await?;
//!         Err(StoreError::Backend("changed my mind".into()))
//!     })
//!     .await;
//!
//! assert!(result.is_err());
//! assert_eq!(db.stats().rolled_back, 1);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/moneyflow-store/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod memory;
mod postgres;
mod record;
mod scope;
mod transactor;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryDb, MemoryHandle, TxStats};
pub use postgres::{PgHandle, PgTransactor};
pub use record::{Record, RecordStore};
pub use scope::Scope;
pub use transactor::{Executor, Query, Transactor};
