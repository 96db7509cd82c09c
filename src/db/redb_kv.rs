//! Redb-backed key/value namespace.
//!
//! # Schema
//!
//! ```text
//! HIDDEN_CHANNELS: identifier -> comma-joined hidden channel list
//! ```

use super::{KvStore, StoreError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Redb table holding one row per identifier.
const HIDDEN_CHANNELS: TableDefinition<&str, &str> = TableDefinition::new("hidden_channels");

/// Durable [`KvStore`] on a Redb database file.
pub struct RedbKv {
    db: Arc<Database>,
}

impl RedbKv {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::warn!(path = %parent.display(), error = %e, "Failed to create store directory");
        }

        let db = Database::create(path)?;
        info!(path = %path.display(), "Visibility store opened");
        Self::new(Arc::new(db))
    }

    /// Use an existing Redb database, which may be shared with other tables.
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(HIDDEN_CHANNELS)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }
}

impl KvStore for RedbKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HIDDEN_CHANNELS)?;
        let value = table.get(key)?.map(|v| v.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(HIDDEN_CHANNELS)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        debug!(identifier = %key, "Persisted hidden channel set");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(HIDDEN_CHANNELS)?;
            table.remove(key)?.is_some()
        };
        write_txn.commit()?;
        if deleted {
            debug!(identifier = %key, "Deleted hidden channel set");
        }
        Ok(deleted)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HIDDEN_CHANNELS)?;
        let mut keys = Vec::new();
        for item in table.iter()? {
            let (key, _value) = item?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filter.redb");

        {
            let kv = RedbKv::open(&path).unwrap();
            kv.set("phone", "#a,#b").unwrap();
            kv.set("laptop", "").unwrap();
        }

        let kv = RedbKv::open(&path).unwrap();
        assert_eq!(kv.get("phone").unwrap().as_deref(), Some("#a,#b"));
        assert_eq!(kv.get("laptop").unwrap().as_deref(), Some(""));
        assert_eq!(kv.keys().unwrap(), vec!["laptop", "phone"]);
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let kv = RedbKv::open(dir.path().join("filter.redb")).unwrap();

        kv.set("phone", "#a").unwrap();
        assert!(kv.delete("phone").unwrap());
        assert!(!kv.delete("phone").unwrap());
        assert_eq!(kv.get("phone").unwrap(), None);
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("filter.redb");
        let kv = RedbKv::open(&path).unwrap();
        kv.set("phone", "").unwrap();
        assert!(path.exists());
    }
}
