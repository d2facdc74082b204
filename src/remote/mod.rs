//! Remote source of truth for culture records
//!
//! The ledger never talks to the network directly; it goes through a
//! [`RemoteSource`] so the HTTP client can be swapped for [`MockRemote`] in
//! tests and offline demos.

use async_trait::async_trait;
use thiserror::Error;

use crate::culture::{Catalogue, Culture};
use crate::deadline::Deadline;

mod http;
mod mock;

pub use http::HttpRemote;
pub use mock::MockRemote;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("culture not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl RemoteError {
    /// Whether repeating the request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// Read access to the authoritative culture records
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch a single culture by name
    async fn get_record(&self, name: &str, deadline: &Deadline) -> Result<Culture>;

    /// List every culture name with its last-modified timestamp
    async fn list_records(&self, deadline: &Deadline) -> Result<Catalogue>;
}
