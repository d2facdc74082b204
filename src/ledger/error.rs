use thiserror::Error;

use crate::codec::CodecError;
use crate::deadline::Elapsed;
use crate::remote::RemoteError;
use crate::storage::StoreError;

/// Failures turning stored or fetched bytes back into data
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unexpected index shape: {0}")]
    IndexShape(String),

    #[error("Malformed remote response: {0}")]
    Response(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Culture not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid culture name: {0:?}")]
    InvalidName(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

/// Flat classification of [`LedgerError`] for callers deciding what to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Network,
    Server,
    Storage,
    Decode,
    InvalidName,
    DeadlineExceeded,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::Network(_) => ErrorKind::Network,
            LedgerError::Server { .. } => ErrorKind::Server,
            LedgerError::Storage(_) => ErrorKind::Storage,
            LedgerError::Decode(_) => ErrorKind::Decode,
            LedgerError::InvalidName(_) => ErrorKind::InvalidName,
            LedgerError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
        }
    }

    /// Whether the same call may succeed later without any local change
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Network(_) | LedgerError::DeadlineExceeded => true,
            LedgerError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<RemoteError> for LedgerError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::NotFound(name) => LedgerError::NotFound(name),
            RemoteError::Network(message) => LedgerError::Network(message),
            RemoteError::Server { status, message } => LedgerError::Server { status, message },
            RemoteError::Malformed(message) => DecodeError::Response(message).into(),
            RemoteError::DeadlineExceeded => LedgerError::DeadlineExceeded,
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        LedgerError::Decode(error.into())
    }
}

impl From<CodecError> for LedgerError {
    fn from(error: CodecError) -> Self {
        LedgerError::Decode(error.into())
    }
}

impl From<Elapsed> for LedgerError {
    fn from(_: Elapsed) -> Self {
        LedgerError::DeadlineExceeded
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_errors_map_to_taxonomy() {
        let cases = [
            (RemoteError::NotFound("A".into()), ErrorKind::NotFound),
            (RemoteError::Network("down".into()), ErrorKind::Network),
            (
                RemoteError::Server {
                    status: 500,
                    message: "boom".into(),
                },
                ErrorKind::Server,
            ),
            (RemoteError::Malformed("junk".into()), ErrorKind::Decode),
            (RemoteError::DeadlineExceeded, ErrorKind::DeadlineExceeded),
        ];

        for (remote, kind) in cases {
            assert_eq!(LedgerError::from(remote).kind(), kind);
        }
    }

    #[test]
    fn test_retryable() {
        assert!(LedgerError::Network("x".into()).is_retryable());
        assert!(LedgerError::Server {
            status: 503,
            message: "x".into()
        }
        .is_retryable());
        assert!(!LedgerError::Server {
            status: 403,
            message: "x".into()
        }
        .is_retryable());
        assert!(!LedgerError::NotFound("x".into()).is_retryable());
        assert!(!LedgerError::Decode(DecodeError::IndexShape("x".into())).is_retryable());
    }

    #[test]
    fn test_json_error_is_decode() {
        let error: LedgerError = serde_json::from_str::<i64>("nope").unwrap_err().into();
        assert_eq!(error.kind(), ErrorKind::Decode);
    }
}
