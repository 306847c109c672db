//! BLAKE3 hashing utilities for APK integrity

use blake3::Hasher;

use crate::error::{BundletoolError, Result};

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Calculate the BLAKE3 digest of a byte buffer
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex())
}

/// Verify that `bytes` match an expected digest
pub fn verify_digest(name: &str, bytes: &[u8], expected: &str) -> Result<()> {
    if !expected.starts_with(HASH_PREFIX) {
        return Err(BundletoolError::ParseFailed {
            what: name.to_string(),
            reason: format!("unsupported digest format '{expected}'"),
        });
    }
    let actual = digest(bytes);
    if actual != expected {
        return Err(BundletoolError::InvalidBundle {
            message: format!(
                "Digest mismatch for '{name}': expected {expected}, found {actual}. \
                 The APK Set is corrupt."
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_format() {
        let hash = digest(b"test content");
        assert!(hash.starts_with(HASH_PREFIX));
        assert_eq!(hash.len(), HASH_PREFIX.len() + 64);
    }

    #[test]
    fn test_digest_deterministic() {
        assert_eq!(digest(b"apk"), digest(b"apk"));
        assert_ne!(digest(b"apk"), digest(b"apk2"));
    }

    #[test]
    fn test_verify_digest() {
        let expected = digest(b"apk bytes");
        assert!(verify_digest("a.apk", b"apk bytes", &expected).is_ok());
        assert!(verify_digest("a.apk", b"tampered", &expected).is_err());
        assert!(verify_digest("a.apk", b"apk bytes", "sha1:abc").is_err());
    }
}
