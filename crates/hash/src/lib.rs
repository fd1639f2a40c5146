#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! SHA-256 content verification for cmirror
//!
//! The registry publishes a SHA-256 digest for every artifact. This crate
//! provides the digest value type, streaming computation over files and
//! byte chunks, and the comparison used before an artifact is committed.

mod streaming;

pub use streaming::StreamingHasher;

use cmirror_errors::{Error, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming hash computation
pub const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Length in bytes of a digest
pub const HASH_LEN: usize = 32;

/// A SHA-256 digest value
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash {
    bytes: [u8; HASH_LEN],
}

impl Hash {
    /// Create a hash from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.bytes
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from hex string
    ///
    /// # Errors
    /// Returns an error if the input string is not valid hexadecimal or is not exactly 64 characters (32 bytes).
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| StorageError::CorruptedData {
            message: format!("invalid hex: {e}"),
        })?;

        let array: [u8; HASH_LEN] =
            bytes
                .try_into()
                .map_err(|bytes: Vec<u8>| StorageError::CorruptedData {
                    message: format!("hash must be {HASH_LEN} bytes, got {}", bytes.len()),
                })?;

        Ok(Self::from_bytes(array))
    }

    /// Compute hash of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        let mut hasher = StreamingHasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Compute hash of a file, reading it in chunks
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, read, or if any I/O operation fails.
    pub async fn hash_file(path: &Path) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))?;

        let mut hasher = StreamingHasher::new();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file
                .read(&mut buffer)
                .await
                .map_err(|e| Error::io_with_path(&e, path))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(hasher.finalize())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Byte-exact comparison of a computed digest against the expected one
#[must_use]
pub fn verify(actual: &Hash, expected: &Hash) -> bool {
    actual.as_bytes() == expected.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    // SHA-256 of "hello world"
    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_hash_basics() {
        let hash = Hash::from_data(b"hello world");
        assert_eq!(hash.to_hex(), HELLO_WORLD);
    }

    #[test]
    fn test_hash_serialization() {
        let hash = Hash::from_data(b"test");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let deserialized: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, deserialized);
    }

    #[test]
    fn test_hex_is_case_insensitive() {
        let upper = Hash::from_hex(&HELLO_WORLD.to_uppercase()).unwrap();
        assert_eq!(upper.to_hex(), HELLO_WORLD);
    }

    #[tokio::test]
    async fn test_hash_file() {
        use std::io::Write;
        let mut temp = NamedTempFile::new().unwrap();
        let data = b"test file content";
        temp.write_all(data).unwrap();

        let hash = Hash::hash_file(temp.path()).await.unwrap();
        assert_eq!(hash, Hash::from_data(data));
    }

    #[tokio::test]
    async fn test_hash_file_larger_than_chunk() {
        use std::io::Write;
        let mut temp = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        temp.write_all(&data).unwrap();

        let hash = Hash::hash_file(temp.path()).await.unwrap();
        assert_eq!(hash, Hash::from_data(&data));
    }

    #[tokio::test]
    async fn test_hash_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Hash::hash_file(&dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::PathNotFound { .. })
        ));
    }
}
