use std::io::{self, Read};

use crate::{Hasher, Result, VerificationError, hex_matches};

/// Streaming reader that hashes data as it passes through.
pub struct VerifiedReader<R, H> {
    reader: R,
    hasher: H,
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self { Self { reader, hasher } }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
        }
        Ok(n)
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Compare everything read so far against a hex digest.
    pub fn finish(self, expected_hex: &str) -> Result<()> {
        let actual = hex::encode(self.hasher.finalize());
        if hex_matches(expected_hex, &actual) {
            Ok(())
        } else {
            Err(VerificationError::Mismatch {
                expected: expected_hex.to_ascii_lowercase(),
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sha256Hasher;
    use std::io::Cursor;

    #[test]
    fn sha256_of_known_input() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"hello world");
        let hash = hasher.finalize();

        let expected =
            hex::decode("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
                .unwrap();
        assert_eq!(hash, expected);
    }

    #[test]
    fn reader_passes_data_through() {
        let data = b"shaper-v1.safetensors payload";
        let expected = hex::encode(Sha256Hasher::digest(data));

        let mut verified = VerifiedReader::new(Cursor::new(data), Sha256Hasher::new());
        let mut sink = Vec::new();
        io::copy(&mut verified, &mut sink).unwrap();

        assert_eq!(sink, data);
        verified.finish(&expected).unwrap();
    }

    #[test]
    fn reader_reports_mismatch() {
        let mut verified = VerifiedReader::new(Cursor::new(b"test data"), Sha256Hasher::new());
        io::copy(&mut verified, &mut io::sink()).unwrap();

        match verified.finish(&"0".repeat(64)) {
            Err(VerificationError::Mismatch { expected, actual }) => {
                assert_eq!(expected, "0".repeat(64));
                assert_ne!(actual, expected);
            }
            other => panic!("expected Mismatch, got {other:?}"),
        }
    }
}
