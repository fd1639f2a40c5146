//! Per-record synchronization state machine

use cmirror_errors::{Error, StorageError, SyncError};
use cmirror_events::{EventEmitter, EventSender, FailureContext, SyncEvent};
use cmirror_hash::{verify, Hash};
use cmirror_index::PackageVersionRecord;
use cmirror_net::{ArtifactFetcher, DownloadTemplate};
use cmirror_types::{PackageId, RecordOutcome};
use futures::FutureExt;
use std::any::Any;
use std::io;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_util::sync::CancellationToken;

/// Brings the cache entry of one record in line with the index
///
/// 1. A committed artifact with the right digest is left alone, no network.
/// 2. A committed artifact with the wrong digest is deleted.
/// 3. Otherwise the artifact is fetched to its partial name, then renamed
///    to the committed name on a digest match or to the quarantine name on
///    a mismatch.
///
/// Every failure stays inside the record and becomes its outcome.
pub struct RecordProcessor {
    cache_dir: PathBuf,
    fetcher: ArtifactFetcher,
    template: DownloadTemplate,
    tx: Option<EventSender>,
}

impl EventEmitter for RecordProcessor {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl RecordProcessor {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        fetcher: ArtifactFetcher,
        template: DownloadTemplate,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            fetcher,
            template,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Run the state machine for one record
    pub async fn process(
        &self,
        record: &PackageVersionRecord,
        cancel: &CancellationToken,
    ) -> RecordOutcome {
        let id = record.id();
        let attempt = AssertUnwindSafe(self.try_process(record, &id, cancel))
            .catch_unwind()
            .await;

        match attempt {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) if e.is_cancelled() => RecordOutcome::Aborted,
            Ok(Err(e)) => {
                let error = SyncError::RecordFailed {
                    package: id.to_string(),
                    message: e.to_string(),
                };
                self.record_failed(id, &error);
                RecordOutcome::Failed
            }
            Err(panic) => {
                let error = SyncError::RecordPanicked {
                    package: id.to_string(),
                    message: panic_message(panic.as_ref()),
                };
                self.record_failed(id, &error);
                RecordOutcome::Failed
            }
        }
    }

    async fn try_process(
        &self,
        record: &PackageVersionRecord,
        id: &PackageId,
        cancel: &CancellationToken,
    ) -> Result<RecordOutcome, Error> {
        let committed = self.cache_dir.join(id.artifact_file_name());

        if fs::try_exists(&committed)
            .await
            .map_err(|e| Error::io_with_path(&e, &committed))?
        {
            let actual = Hash::hash_file(&committed).await?;
            if verify(&actual, &record.checksum) {
                self.emit_sync(SyncEvent::RecordUpToDate {
                    package: id.clone(),
                });
                return Ok(RecordOutcome::UpToDate);
            }

            let mismatch = checksum_mismatch(&committed, &record.checksum, &actual);
            self.emit_sync(SyncEvent::StaleArtifactReplaced {
                package: id.clone(),
                expected: record.checksum.to_hex(),
                actual: actual.to_hex(),
                failure: FailureContext::from_error(&mismatch),
            });
            remove_if_exists(&committed).await?;
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let partial = self.cache_dir.join(id.partial_file_name());
        let url = self.template.url_for(id, &record.checksum);
        self.emit_sync(SyncEvent::FetchStarted {
            package: id.clone(),
            url: url.clone(),
        });

        let fetched = match self.fetcher.fetch(&url, &partial, cancel).await {
            Ok(fetched) => fetched,
            Err(Error::Network(cause)) => {
                let error = SyncError::FetchFailed {
                    package: id.to_string(),
                    url: url.clone(),
                    cause,
                };
                self.emit_sync(SyncEvent::FetchFailed {
                    package: id.clone(),
                    url,
                    failure: FailureContext::from_error(&error),
                });
                return Ok(RecordOutcome::FetchFailed);
            }
            Err(e) => return Err(e),
        };

        if verify(&fetched.hash, &record.checksum) {
            commit(&partial, &committed).await?;
            self.emit_sync(SyncEvent::Downloaded {
                package: id.clone(),
                bytes: fetched.bytes,
            });
            Ok(RecordOutcome::Downloaded)
        } else {
            let quarantined = self.cache_dir.join(id.quarantine_file_name());
            commit(&partial, &quarantined).await?;
            let mismatch = checksum_mismatch(&quarantined, &record.checksum, &fetched.hash);
            self.emit_sync(SyncEvent::Corrupt {
                package: id.clone(),
                expected: record.checksum.to_hex(),
                actual: fetched.hash.to_hex(),
                quarantined,
                failure: FailureContext::from_error(&mismatch),
            });
            Ok(RecordOutcome::Corrupt)
        }
    }

    fn record_failed(&self, package: PackageId, error: &SyncError) {
        self.emit_sync(SyncEvent::RecordFailed {
            package,
            failure: FailureContext::from_error(error),
        });
    }
}

/// Rename a finished download into place, removing it if the rename fails
async fn commit(from: &Path, to: &Path) -> Result<(), Error> {
    if let Err(e) = fs::rename(from, to).await {
        let _ = fs::remove_file(from).await;
        return Err(StorageError::AtomicRenameFailed {
            message: format!("{} -> {}: {e}", from.display(), to.display()),
        }
        .into());
    }
    Ok(())
}

fn checksum_mismatch(path: &Path, expected: &Hash, actual: &Hash) -> StorageError {
    StorageError::ChecksumMismatch {
        path: path.display().to_string(),
        expected: expected.to_hex(),
        actual: actual.to_hex(),
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[test]
    fn test_checksum_mismatch_failure_context() {
        let expected = Hash::from_data(b"index");
        let actual = Hash::from_data(b"payload");
        let failure = FailureContext::from_error(&checksum_mismatch(
            Path::new("/cache/foo-1.0.0.crate~corrupted"),
            &expected,
            &actual,
        ));

        assert_eq!(failure.code.as_deref(), Some("storage.checksum_mismatch"));
        assert!(failure.message.contains(&expected.to_hex()));
        assert!(failure.message.contains(&actual.to_hex()));
        assert!(failure.retryable);
    }

    #[tokio::test]
    async fn test_remove_if_exists_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        remove_if_exists(&dir.path().join("gone.crate")).await.unwrap();
    }
}
