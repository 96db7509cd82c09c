//! Persistent key/value namespace backing the visibility store.
//!
//! The filter only needs a flat `identifier -> serialized hidden set`
//! mapping, so persistence is modeled as a tiny [`KvStore`] trait with two
//! backends:
//! - [`RedbKv`]: durable, one Redb table
//! - [`MemoryKv`]: process-local, for tests and ephemeral deployments

mod memory;
mod redb_kv;

pub use memory::MemoryKv;
pub use redb_kv::RedbKv;

use crate::config::{StoreBackend, StoreConfig};
use std::sync::Arc;
use thiserror::Error;

/// Errors from the persistence substrate.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Static label for metrics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Redb(_) => "redb",
            Self::Database(_) => "database",
            Self::Table(_) => "table",
            Self::Storage(_) => "storage",
            Self::Transaction(_) => "transaction",
            Self::Commit(_) => "commit",
            Self::Unavailable(_) => "unavailable",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// A string key/value namespace owned by the filter.
///
/// Implementations must make each `set`/`delete` atomic: a reader never
/// observes a half-written value.
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Returns whether it existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// All keys, in ascending order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Open the backend selected by configuration.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn KvStore>, StoreError> {
    match config.backend {
        StoreBackend::Redb => Ok(Arc::new(RedbKv::open(&config.path)?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryKv::new())),
    }
}
