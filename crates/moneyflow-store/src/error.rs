//! Store error types.

use thiserror::Error;

/// Errors raised by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched.
    #[error("not found")]
    NotFound,

    /// A row with the same id already exists.
    #[error("duplicate id '{id}' in table '{table}'")]
    Duplicate {
        /// Table name.
        table: String,
        /// Conflicting id.
        id: String,
    },

    /// The caller went away before the work finished.
    #[error("operation cancelled")]
    Cancelled,

    /// The unit of work panicked and was rolled back.
    #[error("transaction panicked: {0}")]
    Panicked(String),

    /// The transaction handle was used after commit or rollback.
    #[error("transaction already closed")]
    TransactionClosed,

    /// A record could not be converted to or from its row form.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("backend: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
