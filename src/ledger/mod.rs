//! Offline ledger of downloaded cultures
//!
//! The ledger keeps a compressed copy of selected remote cultures in the
//! device store, plus an index of what is cached and how fresh it is.
//!
//! ## Layout
//!
//! - index key (default `@ledger`): JSON object `{ "<name>": <modified> }`
//! - every other key: a compressed culture payload stored under its name
//!
//! ## Consistency
//!
//! A name is in the index iff its payload is in the store. Payload and index
//! writes are separate, so a crash between them can leave a payload without an
//! index entry; [`Ledger::audit`] reports the reverse anomaly (index entry
//! without payload). Index read-modify-write cycles are serialized through a
//! per-ledger lock, so concurrent `add`/`remove` calls never lose each other's
//! updates. Use one `Ledger` per store per process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use culture_ledger::ledger::Ledger;
//!
//! let ledger = Ledger::new(store, remote);
//! ledger.add("Japan").await?;
//! let japan = ledger.read("Japan").await?;
//! let report = ledger.update().await?;
//! ```

pub mod error;
pub mod index;
mod refresh;

pub use error::{DecodeError, ErrorKind, LedgerError, Result};
pub use index::{LedgerIndex, DEFAULT_INDEX_KEY};
pub use refresh::{stale_entries, UpdateReport};

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::codec::Codec;
use crate::culture::{Catalogue, Culture};
use crate::deadline::Deadline;
use crate::observability::Metrics;
use crate::remote::RemoteSource;
use crate::storage::KeyValueStore;

pub struct Ledger {
    store: Arc<dyn KeyValueStore>,
    remote: Arc<dyn RemoteSource>,
    codec: Codec,
    index_key: String,
    index_lock: Mutex<()>,
    metrics: Arc<Metrics>,
}

/// Result of [`Ledger::audit`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// Indexed and readable
    pub healthy: Vec<String>,
    /// Indexed, but no payload in the store
    pub missing: Vec<String>,
    /// Indexed, payload present but unreadable (name, reason)
    pub undecodable: Vec<(String, String)>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.undecodable.is_empty()
    }
}

impl Ledger {
    pub fn new(store: Arc<dyn KeyValueStore>, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            store,
            remote,
            codec: Codec::default(),
            index_key: DEFAULT_INDEX_KEY.to_string(),
            index_lock: Mutex::new(()),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_index_key(mut self, key: impl Into<String>) -> Self {
        self.index_key = key.into();
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn index_key(&self) -> &str {
        &self.index_key
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Every cached culture and the modified time of its cached copy
    ///
    /// An empty store yields an empty map.
    pub async fn list(&self) -> Result<Catalogue> {
        Ok(self.read_index().await?.into_catalogue())
    }

    /// Read a cached culture without touching the network or the index
    pub async fn read(&self, name: &str) -> Result<Culture> {
        self.read_within(name, &Deadline::none()).await
    }

    pub async fn read_within(&self, name: &str, deadline: &Deadline) -> Result<Culture> {
        self.check_name(name)?;
        check_deadline(deadline)?;

        let payload = deadline
            .run(self.store.get_item(name))
            .await??
            .ok_or_else(|| LedgerError::NotFound(name.to_string()))?;

        let text = self.codec.decompress(&payload)?;
        let culture = serde_json::from_str(&text)?;
        debug!(name, size = payload.len(), "Read cached culture");
        Ok(culture)
    }

    /// Download `name` and cache it, replacing any cached copy
    pub async fn add(&self, name: &str) -> Result<()> {
        self.add_within(name, &Deadline::none()).await
    }

    /// [`Ledger::add`] bounded by `deadline`
    ///
    /// The deadline covers the fetch, waiting for the index lock and the
    /// payload write. Once the payload is stored the index update always runs
    /// to completion.
    pub async fn add_within(&self, name: &str, deadline: &Deadline) -> Result<()> {
        self.fetch_and_store(name, deadline, false).await?;
        Ok(())
    }

    /// Fetch `name` and cache it; returns `false` when `only_if_cached` is set
    /// and `name` left the index before the lock was taken
    async fn fetch_and_store(
        &self,
        name: &str,
        deadline: &Deadline,
        only_if_cached: bool,
    ) -> Result<bool> {
        self.check_name(name)?;
        check_deadline(deadline)?;

        let culture = deadline
            .run(self.remote.get_record(name, deadline))
            .await??;
        if culture.name != name {
            warn!(name, served = %culture.name, "Remote served a culture under another name");
        }

        let payload = self.codec.compress(&serde_json::to_string(&culture)?)?;
        let size = payload.len();

        let _guard = deadline.run(self.index_lock.lock()).await?;

        let mut index = self.read_index().await?;
        if only_if_cached && !index.contains(name) {
            debug!(name, "Culture removed while fetching, not caching it");
            return Ok(false);
        }

        deadline.run(self.store.set_item(name, payload)).await??;

        let previous = index.insert(name, culture.modified);
        self.write_index(&index).await?;

        self.metrics.record_added();
        info!(name, modified = culture.modified, ?previous, size, "Cached culture");
        Ok(true)
    }

    /// Forget `name`
    ///
    /// Payload deletion is best effort; the index entry is always dropped and
    /// the index is always rewritten, even when `name` was not cached.
    pub async fn remove(&self, name: &str) -> Result<()> {
        self.check_name(name)?;

        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;

        if index.contains(name) {
            if let Err(e) = self.store.remove_item(name).await {
                self.metrics.orphaned_payload();
                warn!(name, error = %e, "Failed to delete cached payload, leaving it orphaned");
            }
        }

        let was_cached = index.remove(name).is_some();
        self.write_index(&index).await?;

        if was_cached {
            self.metrics.record_removed();
        }
        info!(name, was_cached, "Removed culture from ledger");
        Ok(())
    }

    /// Check every indexed culture against its stored payload
    pub async fn audit(&self) -> Result<AuditReport> {
        let index = self.read_index().await?;
        let mut report = AuditReport::default();

        for name in index.names() {
            match self.read(name).await {
                Ok(_) => report.healthy.push(name.to_string()),
                Err(LedgerError::NotFound(_)) => report.missing.push(name.to_string()),
                Err(LedgerError::Decode(e)) => {
                    report.undecodable.push((name.to_string(), e.to_string()))
                }
                Err(e @ LedgerError::InvalidName(_)) => {
                    report.undecodable.push((name.to_string(), e.to_string()))
                }
                Err(e) => return Err(e),
            }
        }

        if !report.is_clean() {
            warn!(
                missing = report.missing.len(),
                undecodable = report.undecodable.len(),
                "Ledger audit found inconsistencies"
            );
        }
        Ok(report)
    }

    async fn read_index(&self) -> Result<LedgerIndex> {
        match self.store.get_item(&self.index_key).await? {
            Some(bytes) => Ok(LedgerIndex::decode(&bytes)?),
            None => Ok(LedgerIndex::new()),
        }
    }

    async fn write_index(&self, index: &LedgerIndex) -> Result<()> {
        self.store.set_item(&self.index_key, index.encode()?).await?;
        debug!(entries = index.len(), "Wrote ledger index");
        Ok(())
    }

    /// Names that would collide with the index key are refused
    fn check_name(&self, name: &str) -> Result<()> {
        if name.is_empty() || name == self.index_key {
            return Err(LedgerError::InvalidName(name.to_string()));
        }
        Ok(())
    }
}

fn check_deadline(deadline: &Deadline) -> Result<()> {
    if deadline.is_expired() {
        return Err(LedgerError::DeadlineExceeded);
    }
    Ok(())
}
