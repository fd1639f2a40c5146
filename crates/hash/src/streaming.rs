//! Incremental digest computation for data arriving in chunks

use crate::Hash;
use sha2::{Digest, Sha256};

/// Accumulates a SHA-256 digest over a sequence of byte chunks
///
/// Used by the fetcher to hash payload bytes as they stream to disk so
/// the artifact never has to be re-read before verification.
#[derive(Clone, Default)]
pub struct StreamingHasher {
    inner: Sha256,
    bytes: u64,
}

impl StreamingHasher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk
    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Number of bytes fed so far
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    /// Consume the hasher and produce the digest
    #[must_use]
    pub fn finalize(self) -> Hash {
        Hash::from_bytes(self.inner.finalize().into())
    }
}

impl std::fmt::Debug for StreamingHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingHasher")
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_matches_whole() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut hasher = StreamingHasher::new();
        for chunk in data.chunks(5) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.bytes_hashed(), data.len() as u64);
        assert_eq!(hasher.finalize(), Hash::from_data(data));
    }

    #[test]
    fn test_empty_input() {
        // SHA-256 of the empty string
        assert_eq!(
            StreamingHasher::new().finalize().to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
