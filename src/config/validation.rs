use super::models::{Config, StoreBackend};
use crate::humanize::ByteSize;
use thiserror::Error;

/// Largest `max_record_bytes` accepted
const MAX_RECORD_BYTES_LIMIT: u64 = 64 * ByteSize::MIB;

const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("store.index_key must not be empty")]
    EmptyIndexKey,

    #[error("store.path must be set for the {backend:?} backend")]
    MissingStorePath { backend: StoreBackend },

    #[error("remote.base_url '{url}' must start with http:// or https://")]
    InvalidBaseUrl { url: String },

    #[error("remote.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("remote.max_retries ({actual}) exceeds limit of {limit}")]
    TooManyRetries { actual: u32, limit: u32 },

    #[error("codec.max_record_bytes ({actual}) must be between 1B and {limit}")]
    InvalidRecordLimit { actual: ByteSize, limit: ByteSize },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_store(config)?;
    validate_remote(config)?;
    validate_codec(config)?;
    Ok(())
}

fn validate_store(config: &Config) -> Result<(), ValidationError> {
    if config.store.index_key.is_empty() {
        return Err(ValidationError::EmptyIndexKey);
    }

    let needs_path = matches!(
        config.store.backend,
        StoreBackend::Fjall | StoreBackend::Filesystem
    );
    if needs_path && config.store.path.as_os_str().is_empty() {
        return Err(ValidationError::MissingStorePath {
            backend: config.store.backend,
        });
    }

    Ok(())
}

fn validate_remote(config: &Config) -> Result<(), ValidationError> {
    let remote = &config.remote;

    if !remote.base_url.starts_with("http://") && !remote.base_url.starts_with("https://") {
        return Err(ValidationError::InvalidBaseUrl {
            url: remote.base_url.clone(),
        });
    }

    if remote.connect_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "connect_timeout",
        });
    }
    if remote.request_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "request_timeout",
        });
    }

    if remote.max_retries > MAX_RETRIES_LIMIT {
        return Err(ValidationError::TooManyRetries {
            actual: remote.max_retries,
            limit: MAX_RETRIES_LIMIT,
        });
    }

    Ok(())
}

fn validate_codec(config: &Config) -> Result<(), ValidationError> {
    let actual = config.codec.max_record_bytes;
    if actual.as_u64() == 0 || actual.as_u64() > MAX_RECORD_BYTES_LIMIT {
        return Err(ValidationError::InvalidRecordLimit {
            actual,
            limit: ByteSize(MAX_RECORD_BYTES_LIMIT),
        });
    }
    Ok(())
}
