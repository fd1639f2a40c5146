//! Streaming artifact fetch with in-flight hashing

use crate::client::NetClient;
use cmirror_errors::{Error, NetworkError};
use cmirror_hash::{Hash, StreamingHasher};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// What a successful fetch produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub bytes: u64,
    /// Digest of exactly the bytes written to the destination
    pub hash: Hash,
}

/// Streams artifacts from the remote registry to local files
#[derive(Clone)]
pub struct ArtifactFetcher {
    client: NetClient,
    chunk_timeout: Duration,
}

impl ArtifactFetcher {
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        let chunk_timeout = client.config().chunk_timeout;
        Self {
            client,
            chunk_timeout,
        }
    }

    /// Stream `url` into `dest`, hashing every chunk on the way
    ///
    /// The body is never held in memory as a whole. Whatever happens, no
    /// file is left at `dest` unless the fetch succeeded; the digest is not
    /// compared here.
    ///
    /// # Errors
    ///
    /// Returns a network error for connection failures, non-success
    /// statuses and stalled bodies, an I/O error if `dest` cannot be
    /// written, and [`Error::Cancelled`] if `cancel` fires first.
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, Error> {
        let result = self.fetch_inner(url, dest, cancel).await;
        if result.is_err() {
            // Best effort: the file may never have been created
            let _ = fs::remove_file(dest).await;
        }
        result
    }

    async fn fetch_inner(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, Error> {
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            response = self.client.get(url) => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message: status.to_string(),
            }
            .into());
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;
        let mut hasher = StreamingHasher::new();
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                next = tokio::time::timeout(self.chunk_timeout, stream.next()) => next,
            };

            match next {
                Ok(Some(chunk)) => {
                    let chunk = chunk.map_err(|e| NetClient::classify(url, &e))?;
                    hasher.update(&chunk);
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| Error::io_with_path(&e, dest))?;
                }
                Ok(None) => break,
                Err(_) => {
                    return Err(NetworkError::Timeout {
                        url: url.to_string(),
                    }
                    .into());
                }
            }
        }

        file.flush()
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;
        file.sync_all()
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;

        Ok(FetchOutcome {
            bytes: hasher.bytes_hashed(),
            hash: hasher.finalize(),
        })
    }
}
