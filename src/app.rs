//! Wiring a [`Ledger`] from configuration

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, RemoteConfig, StoreBackend, StoreConfig};
use crate::ledger::Ledger;
use crate::remote::{HttpRemote, RemoteError, RemoteSource};
use crate::storage::{FjallStore, KeyValueStore, ObjectKvStore, StoreError};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Open the configured store backend
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StoreBackend::Fjall => Arc::new(FjallStore::open(&config.path, config.sync_writes)?),
        StoreBackend::Filesystem => Arc::new(ObjectKvStore::filesystem(&config.path)?),
        StoreBackend::Memory => Arc::new(ObjectKvStore::in_memory()),
    };
    info!(backend = ?config.backend, path = %config.path.display(), "Store ready");
    Ok(store)
}

/// Build the HTTP remote for the configured culture service
pub fn open_remote(config: &RemoteConfig) -> Result<Arc<dyn RemoteSource>, RemoteError> {
    let remote = HttpRemote::new(config.clone())?;
    info!(base_url = %config.base_url, "Remote ready");
    Ok(Arc::new(remote))
}

/// Ledger over the configured store and remote
pub fn build_ledger(config: &Config) -> Result<Ledger, AnyError> {
    let store = open_store(&config.store)?;
    let remote = open_remote(&config.remote)?;
    Ok(assemble(config, store, remote))
}

/// Ledger over caller-supplied collaborators, configured from `config`
pub fn assemble(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    remote: Arc<dyn RemoteSource>,
) -> Ledger {
    Ledger::new(store, remote)
        .with_codec(config.codec.codec())
        .with_index_key(config.store.index_key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CompressionMethod;
    use crate::culture::Culture;
    use crate::remote::MockRemote;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_each_backend() {
        let temp_dir = TempDir::new().unwrap();

        for backend in [
            StoreBackend::Fjall,
            StoreBackend::Filesystem,
            StoreBackend::Memory,
        ] {
            let config = StoreConfig {
                backend,
                path: temp_dir.path().join(format!("{:?}", backend)),
                sync_writes: false,
                ..StoreConfig::default()
            };
            let store = open_store(&config).unwrap();
            assert!(store.get_item("@ledger").await.unwrap().is_none());
        }
    }

    #[test]
    fn test_open_remote_from_remote_section() {
        let config = RemoteConfig {
            base_url: "https://cultures.example.com/api".to_string(),
            ..RemoteConfig::default()
        };
        assert!(open_remote(&config).is_ok());

        let broken = RemoteConfig {
            base_url: "not a url".to_string(),
            ..RemoteConfig::default()
        };
        assert!(matches!(open_remote(&broken), Err(RemoteError::Network(_))));
    }

    #[tokio::test]
    async fn test_assemble_applies_config() {
        let mut config = Config::default();
        config.store.index_key = "@cultures".to_string();
        config.codec.method = CompressionMethod::Zstd;

        let store = Arc::new(ObjectKvStore::in_memory());
        let remote = Arc::new(MockRemote::with_records([Culture::new("Nepal", 3)]));
        let ledger = assemble(&config, store.clone(), remote);

        ledger.add("Nepal").await.unwrap();
        assert_eq!(ledger.index_key(), "@cultures");

        let payload = store.get_item("Nepal").await.unwrap().unwrap();
        assert_eq!(payload[0], CompressionMethod::Zstd as u8);
    }
}
