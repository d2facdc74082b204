use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use tracing::{debug, info};

use super::{KeyValueStore, Result};

const RECORDS_PARTITION: &str = "records";

/// Fjall-backed store; every key lives in a single `records` partition
#[derive(Clone)]
pub struct FjallStore {
    keyspace: Keyspace,
    records: PartitionHandle,
    sync_writes: bool,
}

impl FjallStore {
    /// Open or create a Fjall store at the given path
    pub fn open<P: AsRef<Path>>(path: P, sync_writes: bool) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Fjall store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let records =
            keyspace.open_partition(RECORDS_PARTITION, PartitionCreateOptions::default())?;

        info!(sync_writes, "Fjall store opened");
        Ok(Self {
            keyspace,
            records,
            sync_writes,
        })
    }

    /// Number of stored keys, including the index
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        for item in self.records.iter() {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.records.is_empty()?)
    }

    /// Flush pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    fn after_write(&self) -> Result<()> {
        if self.sync_writes {
            self.persist()?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FjallStore {
    async fn get_item(&self, key: &str) -> Result<Option<Bytes>> {
        let value = self.records.get(key)?;
        Ok(value.map(|slice| Bytes::copy_from_slice(&slice)))
    }

    async fn set_item(&self, key: &str, value: Bytes) -> Result<()> {
        let size = value.len();
        self.records.insert(key, value.as_ref())?;
        self.after_write()?;
        debug!(key, size, "Stored item");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.records.remove(key)?;
        self.after_write()?;
        debug!(key, "Removed item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FjallStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FjallStore::open(temp_dir.path().join("test_ledger"), false).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (store, _temp) = create_test_store();
        store
            .set_item("Japan", Bytes::from_static(b"payload"))
            .await
            .unwrap();

        let value = store.get_item("Japan").await.unwrap();
        assert_eq!(value.as_deref(), Some(&b"payload"[..]));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (store, _temp) = create_test_store();
        assert!(store.get_item("nothing").await.unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (store, _temp) = create_test_store();
        store
            .set_item("Peru", Bytes::from_static(b"x"))
            .await
            .unwrap();

        store.remove_item("Peru").await.unwrap();
        store.remove_item("Peru").await.unwrap();
        assert!(store.get_item("Peru").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reopen");
        {
            let store = FjallStore::open(&path, true).unwrap();
            store
                .set_item("@ledger", Bytes::from_static(b"{}"))
                .await
                .unwrap();
        }

        let store = FjallStore::open(&path, true).unwrap();
        let value = store.get_item("@ledger").await.unwrap();
        assert_eq!(value.as_deref(), Some(&b"{}"[..]));
    }
}
