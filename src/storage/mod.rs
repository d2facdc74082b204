//! Persistent key-value storage for the ledger
//!
//! The ledger only needs three operations from the device store: read, write
//! and delete a value by string key. Absence is `Ok(None)`, never an error.
//!
//! Backends:
//!
//! - [`FjallStore`] - embedded LSM store (default, durable on device)
//! - [`ObjectKvStore`] - `object_store` backed; in-memory or local filesystem

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

mod embedded;
mod object;

pub use self::embedded::FjallStore;
pub use self::object::ObjectKvStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StoreError>;

/// String-keyed durable store shared by the index and record payloads
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value at `key`; `None` if nothing is stored there
    async fn get_item(&self, key: &str) -> Result<Option<Bytes>>;

    /// Write `value` at `key`, replacing any previous value
    async fn set_item(&self, key: &str, value: Bytes) -> Result<()>;

    /// Delete `key`; deleting an absent key succeeds
    async fn remove_item(&self, key: &str) -> Result<()>;
}
