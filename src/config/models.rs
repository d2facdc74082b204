use crate::codec::{Codec, CompressionMethod};
use crate::humanize::ByteSize;
use crate::ledger::DEFAULT_INDEX_KEY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub codec: CodecConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Where cached cultures are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Embedded Fjall keyspace at `path`
    #[default]
    Fjall,
    /// One file per key under `path`
    Filesystem,
    /// Nothing survives the process
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_index_key")]
    pub index_key: String,
    /// Flush to disk after every write (fjall only)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
            index_key: default_index_key(),
            sync_writes: default_sync_writes(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/ledger")
}

fn default_index_key() -> String {
    DEFAULT_INDEX_KEY.to_string()
}

fn default_sync_writes() -> bool {
    true
}

/// Culture service connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout", with = "crate::humanize::duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_request_timeout", with = "crate::humanize::duration")]
    pub request_timeout: Duration,
    /// Retries after the first attempt, for transient failures only
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff", with = "crate::humanize::duration")]
    pub retry_backoff: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff() -> Duration {
    Duration::from_millis(500)
}

fn default_user_agent() -> String {
    concat!("culture-ledger/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Payload compression settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub method: CompressionMethod,
    /// Largest decompressed culture accepted on read
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: ByteSize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            method: CompressionMethod::default(),
            max_record_bytes: default_max_record_bytes(),
        }
    }
}

impl CodecConfig {
    pub fn codec(&self) -> Codec {
        Codec::new(self.method, self.max_record_bytes)
    }
}

fn default_max_record_bytes() -> ByteSize {
    ByteSize(8 * ByteSize::MIB) // 8 MB
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
