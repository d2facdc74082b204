use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as StoragePath;
use object_store::ObjectStore;

use super::{KeyValueStore, Result};

/// Store wrapping any `object_store` backend
///
/// Each key maps to a single path segment, so names containing `/` do not
/// create nested objects.
#[derive(Clone)]
pub struct ObjectKvStore {
    store: Arc<dyn ObjectStore>,
}

impl ObjectKvStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Volatile store for tests and offline demos
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// One file per key under `root`
    pub fn filesystem<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let local = LocalFileSystem::new_with_prefix(root)?;
        tracing::info!(root = %root.display(), "Opened filesystem store");
        Ok(Self::new(Arc::new(local)))
    }

    fn path(key: &str) -> StoragePath {
        StoragePath::from_iter([key])
    }
}

#[async_trait]
impl KeyValueStore for ObjectKvStore {
    async fn get_item(&self, key: &str) -> Result<Option<Bytes>> {
        match self.store.get(&Self::path(key)).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                tracing::debug!(key, size = bytes.len(), "Read item");
                Ok(Some(bytes))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: Bytes) -> Result<()> {
        let size = value.len();
        self.store.put(&Self::path(key), value.into()).await?;
        tracing::debug!(key, size, "Stored item");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        match self.store.delete(&Self::path(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!(key, "Removed item");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
