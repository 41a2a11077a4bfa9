//! Content verification primitives for archived model files.
//!
//! Hashing is incremental so a download can be verified in the same pass that
//! writes it to disk, and a file already on disk can be checked without being
//! loaded into memory.
//!
//! # Example
//!
//! ```
//! use modvault_verify::{Hasher, Sha256Hasher, hex_matches};
//!
//! let mut hasher = Sha256Hasher::new();
//! hasher.update(b"hello ");
//! hasher.update(b"world");
//! let digest = hex::encode(hasher.finalize());
//!
//! assert!(hex_matches(
//!     "B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9",
//!     &digest
//! ));
//! ```

pub use self::error::{Result, VerificationError};
pub use self::hasher::{Hasher, Sha256Hasher};
pub use self::reader::VerifiedReader;

mod error;
mod hasher;
mod reader;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_BUFFER: usize = 1024 * 1024;

/// Lowercase hex SHA-256 of the file at `path`, streamed in 1 MiB reads.
pub fn sha256_file(path: impl AsRef<Path>) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256Hasher::new();
    let mut buffer = vec![0u8; READ_BUFFER];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Case-insensitive comparison of two hex digests.
pub fn hex_matches(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

/// Check `path` against an expected hex SHA-256.
///
/// A missing file is not an error; it simply does not match.
pub fn file_matches(path: impl AsRef<Path>, expected: &str) -> Result<bool> {
    let path = path.as_ref();
    if !path.is_file() {
        return Ok(false);
    }
    let actual = sha256_file(path)?;
    Ok(hex_matches(expected, &actual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.safetensors");
        std::fs::write(&path, b"hello world").unwrap();
        assert_eq!(sha256_file(&path).unwrap(), HELLO_WORLD);
    }

    #[test]
    fn test_file_matches_uppercase_expected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.safetensors");
        std::fs::write(&path, b"hello world").unwrap();
        assert!(file_matches(&path, &HELLO_WORLD.to_uppercase()).unwrap());
        assert!(!file_matches(&path, &"0".repeat(64)).unwrap());
    }

    #[test]
    fn test_file_matches_missing_file() {
        let dir = tempdir().unwrap();
        assert!(!file_matches(dir.path().join("absent"), HELLO_WORLD).unwrap());
    }
}
