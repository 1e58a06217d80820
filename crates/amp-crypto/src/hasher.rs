use std::fmt;
use std::io::{self, Read};

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Hex-encoded SHA-256 digest (64 lowercase hex characters).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Length of the hex form.
    pub const HEX_LEN: usize = 64;

    /// Parse and normalize a stored digest.
    pub fn from_hex(s: &str) -> Result<Self, HasherError> {
        if s.len() != Self::HEX_LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HasherError::InvalidDigest(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for display.
    pub fn short_hex(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Digest {
    type Error = HasherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self {
        d.0
    }
}

/// Versionable content hasher.
///
/// The algorithm name travels with the hasher so that a future change of
/// algorithm can be recorded next to each digest. Only SHA-256 exists today.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    algorithm: &'static str,
}

impl ContentHasher {
    /// SHA-256 over the full byte sequence.
    pub const SHA256: Self = Self {
        algorithm: "sha256",
    };

    /// Hash raw bytes.
    pub fn digest(&self, data: &[u8]) -> Digest {
        Digest(hex::encode(Sha256::digest(data)))
    }

    /// Hash everything a reader yields, without buffering it all in memory.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<(Digest, u64)> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 64 * 1024];
        let mut total = 0u64;
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            total += n as u64;
        }
        Ok((Digest(hex::encode(hasher.finalize())), total))
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &Digest) -> bool {
        self.digest(data) == *expected
    }

    /// The algorithm name used by this hasher.
    pub fn algorithm(&self) -> &str {
        self.algorithm
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("invalid digest: {0:?}")]
    InvalidDigest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let a = ContentHasher::SHA256.digest(b"hello world");
        let b = ContentHasher::SHA256.digest(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn known_vector() {
        let d = ContentHasher::SHA256.digest(b"hello");
        assert_eq!(
            d.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(d.as_str().len(), Digest::HEX_LEN);
    }

    #[test]
    fn reader_matches_slice() {
        let data = vec![7u8; 200_000];
        let (d, n) = ContentHasher::SHA256.digest_reader(&data[..]).unwrap();
        assert_eq!(n, 200_000);
        assert_eq!(d, ContentHasher::SHA256.digest(&data));
    }

    #[test]
    fn verify_detects_tampering() {
        let d = ContentHasher::SHA256.digest(b"original");
        assert!(ContentHasher::SHA256.verify(b"original", &d));
        assert!(!ContentHasher::SHA256.verify(b"tampered", &d));
    }

    #[test]
    fn from_hex_validates() {
        let d = ContentHasher::SHA256.digest(b"x");
        let upper = d.as_str().to_ascii_uppercase();
        assert_eq!(Digest::from_hex(&upper).unwrap(), d);
        assert!(Digest::from_hex("abc").is_err());
        assert!(Digest::from_hex(&"z".repeat(64)).is_err());
    }

    #[test]
    fn serde_as_string() {
        let d = ContentHasher::SHA256.digest(b"serde");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.as_str()));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
        assert!(serde_json::from_str::<Digest>("\"nope\"").is_err());
    }

    #[test]
    fn algorithm_name() {
        assert_eq!(ContentHasher::SHA256.algorithm(), "sha256");
    }
}
