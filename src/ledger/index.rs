//! Ledger index layout and encoding
//!
//! The index lives under a single well-known key and maps every cached
//! culture name to the `modified` timestamp of its cached copy:
//!
//! ```json
//! { "Japan": 1700000000000, "Peru": 1700000500000 }
//! ```
//!
//! Earlier clients wrapped the same map as `{"cultures": {...}}`. That shape is
//! still read, but writes always use the flat form.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::DecodeError;
use crate::culture::Catalogue;

/// Key the index is stored under unless configured otherwise
pub const DEFAULT_INDEX_KEY: &str = "@ledger";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacyIndex {
    cultures: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IndexDocument {
    Legacy(LegacyIndex),
    Flat(BTreeMap<String, i64>),
}

/// Name -> modified timestamp of every cached culture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LedgerIndex(BTreeMap<String, i64>);

impl LedgerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored index in either the flat or the legacy shape
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        match IndexDocument::deserialize(value) {
            Ok(IndexDocument::Legacy(legacy)) => Ok(Self(legacy.cultures)),
            Ok(IndexDocument::Flat(entries)) => Ok(Self(entries)),
            Err(_) => Err(DecodeError::IndexShape(
                "expected an object of name -> integer timestamp".to_string(),
            )),
        }
    }

    pub fn encode(&self) -> Result<Bytes, DecodeError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: &str, modified: i64) -> Option<i64> {
        self.0.insert(name.to_string(), modified)
    }

    pub fn remove(&mut self, name: &str) -> Option<i64> {
        self.0.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_catalogue(self) -> Catalogue {
        self.0
    }
}

impl From<Catalogue> for LedgerIndex {
    fn from(entries: Catalogue) -> Self {
        Self(entries)
    }
}
