//! Compression codec for cached record payloads
//!
//! Payloads are self-describing so the method can change between releases
//! without invalidating what is already on the device:
//!
//! - Format: `[method: u8][body]`
//! - `lz4` body: little-endian `u32` uncompressed size followed by an LZ4 block
//! - `zstd` body: a single zstd frame (level 3)
//!
//! Compression is deterministic: identical input always yields identical bytes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::humanize::ByteSize;

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("payload is empty")]
    Empty,

    #[error("unknown compression method tag {0}")]
    UnknownMethod(u8),

    #[error("payload truncated")]
    Truncated,

    #[error("decompressed size {actual} exceeds limit of {limit}")]
    TooLarge { actual: u64, limit: ByteSize },

    #[error("LZ4 decompression failed: {0}")]
    Lz4(#[from] lz4_flex::block::DecompressError),

    #[error("Zstd failure: {0}")]
    Zstd(#[from] std::io::Error),

    #[error("decompressed payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Compression method for record payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CompressionMethod {
    /// Fast, moderate ratio
    #[default]
    Lz4 = 1,
    /// Slower, better ratio
    Zstd = 2,
}

impl CompressionMethod {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(CompressionMethod::Lz4),
            2 => Some(CompressionMethod::Zstd),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    method: CompressionMethod,
    max_decompressed: ByteSize,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(CompressionMethod::Lz4, ByteSize(8 * 1024 * 1024))
    }
}

impl Codec {
    pub fn new(method: CompressionMethod, max_decompressed: ByteSize) -> Self {
        Self {
            method,
            max_decompressed,
        }
    }

    pub fn method(&self) -> CompressionMethod {
        self.method
    }

    /// Compress `text` with the configured method
    pub fn compress(&self, text: &str) -> Result<Bytes> {
        let mut out = vec![self.method as u8];
        match self.method {
            CompressionMethod::Lz4 => {
                out.extend_from_slice(&lz4_flex::compress_prepend_size(text.as_bytes()));
            }
            CompressionMethod::Zstd => {
                out.extend_from_slice(&zstd::bulk::compress(text.as_bytes(), ZSTD_LEVEL)?);
            }
        }
        Ok(Bytes::from(out))
    }

    /// Restore the text of a payload written by any supported method
    pub fn decompress(&self, encoded: &[u8]) -> Result<String> {
        let (&tag, body) = encoded.split_first().ok_or(CodecError::Empty)?;
        let method = CompressionMethod::from_u8(tag).ok_or(CodecError::UnknownMethod(tag))?;
        let limit = self.max_decompressed;

        let raw = match method {
            CompressionMethod::Lz4 => {
                let size: [u8; 4] = body
                    .get(..4)
                    .and_then(|prefix| prefix.try_into().ok())
                    .ok_or(CodecError::Truncated)?;
                let declared = u64::from(u32::from_le_bytes(size));
                if declared > limit.as_u64() {
                    return Err(CodecError::TooLarge {
                        actual: declared,
                        limit,
                    });
                }
                lz4_flex::decompress_size_prepended(body)?
            }
            CompressionMethod::Zstd => {
                let capacity = usize::try_from(limit.as_u64()).unwrap_or(usize::MAX);
                zstd::bulk::decompress(body, capacity)?
            }
        };

        Ok(String::from_utf8(raw)?)
    }
}
