//! Error types for modvault-fetch.

use std::io;

use modvault_fs::FsError;
use modvault_verify::VerificationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("rate limited by {url}")]
    RateLimited { url: String },

    #[error("transfer stalled at {rate} B/s (minimum {minimum} B/s)")]
    Stalled { rate: u64, minimum: u64 },

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("file I/O error: {0}")]
    Fs(#[from] FsError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// Failures that come from the remote side or the wire.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_)
                | FetchError::HttpStatus { .. }
                | FetchError::RateLimited { .. }
                | FetchError::Stalled { .. }
        )
    }

    /// The transfer completed but the bytes are not the ones announced.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            FetchError::LengthMismatch { .. } | FetchError::ChecksumMismatch { .. }
        )
    }
}

impl From<VerificationError> for FetchError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::Mismatch { expected, actual } => {
                FetchError::ChecksumMismatch { expected, actual }
            }
            VerificationError::Io(e) => FetchError::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert!(FetchError::Network("reset".into()).is_transient());
        assert!(FetchError::RateLimited { url: "u".into() }.is_transient());
        assert!(!FetchError::LengthMismatch { expected: 1000, actual: 800 }.is_transient());
        assert!(FetchError::LengthMismatch { expected: 1000, actual: 800 }.is_integrity());
        assert!(!FetchError::Io(io::Error::other("disk")).is_integrity());
    }

    #[test]
    fn verification_mismatch_maps_to_checksum() {
        let err: FetchError = VerificationError::Mismatch {
            expected: "aa".into(),
            actual:   "bb".into(),
        }
        .into();
        assert!(matches!(err, FetchError::ChecksumMismatch { .. }));
    }
}
