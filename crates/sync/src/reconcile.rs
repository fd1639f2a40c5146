//! Removing cache entries the index no longer accounts for

use cmirror_errors::{Error, StorageError};
use cmirror_events::{CleanupEvent, EventEmitter, EventSender};
use cmirror_index::{IndexFs, IndexReader};
use cmirror_types::{CacheEntryKind, CleanupReport, RemovalReason};
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tokio::fs;

/// Diffs a cache directory against an index snapshot
///
/// Committed artifacts absent from the index are deleted, as is every
/// partial or quarantined download. Directories and files that do not look
/// like artifacts are never touched. Running it twice in a row removes
/// nothing the second time.
///
/// When part of the index tree cannot be read, the set of referenced
/// artifacts is incomplete: unreferenced artifacts are then kept and
/// counted as `stale_skipped`, while partial and quarantined downloads are
/// still removed.
#[derive(Default)]
pub struct CacheReconciler {
    tx: Option<EventSender>,
}

impl EventEmitter for CacheReconciler {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl CacheReconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Reconcile `cache_dir` against the records of `reader`
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be scanned or the cache
    /// directory cannot be listed. Nothing is deleted in either case. A
    /// single entry that cannot be deleted is counted in the report.
    pub async fn reconcile<F: IndexFs + 'static>(
        &self,
        cache_dir: &Path,
        reader: &IndexReader<F>,
    ) -> Result<CleanupReport, Error> {
        let (records, summary) = reader.collect().await?;
        let expected: HashSet<String> = records
            .iter()
            .map(cmirror_index::PackageVersionRecord::artifact_file_name)
            .collect();
        let snapshot_complete = summary.is_complete();

        let entries = list_files(cache_dir).await?;

        self.emit_cleanup(CleanupEvent::Started {
            cache_dir: cache_dir.to_path_buf(),
        });

        if !snapshot_complete {
            self.emit_warning_with_context(
                "index could not be read completely, keeping unreferenced artifacts",
                format!("{} unreadable index entries", summary.unreadable),
            );
        }

        let mut report = CleanupReport::default();
        for name in entries {
            let reason = match CacheEntryKind::classify(&name) {
                CacheEntryKind::Unrelated => continue,
                CacheEntryKind::Committed if expected.contains(&name) => {
                    report.kept += 1;
                    continue;
                }
                CacheEntryKind::Committed if !snapshot_complete => {
                    report.stale_skipped += 1;
                    continue;
                }
                CacheEntryKind::Committed => RemovalReason::Stale,
                CacheEntryKind::Partial => RemovalReason::Partial,
                CacheEntryKind::Quarantined => RemovalReason::Quarantined,
            };

            let path = cache_dir.join(&name);
            match fs::remove_file(&path).await {
                Ok(()) => {
                    report.record_removal(reason);
                    self.emit_cleanup(CleanupEvent::EntryRemoved { path, reason });
                }
                // Gone already; nothing left to reconcile
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    report.errors += 1;
                    self.emit_cleanup(CleanupEvent::RemovalFailed {
                        path,
                        reason,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.emit_cleanup(CleanupEvent::Completed { report });
        Ok(report)
    }
}

/// Names of the regular files directly inside `dir`, sorted
async fn list_files(dir: &Path) -> Result<Vec<String>, Error> {
    let mut read_dir = fs::read_dir(dir).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::DirectoryNotFound {
                path: dir.to_path_buf(),
            }
        } else {
            StorageError::from_io_with_path(&e, dir)
        }
    })?;

    let mut names = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, dir))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &entry.path()))?;
        if !file_type.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_files_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("index")).await.unwrap();
        fs::write(dir.path().join("b.crate"), b"").await.unwrap();
        fs::write(dir.path().join("a.crate"), b"").await.unwrap();

        let names = list_files(dir.path()).await.unwrap();
        assert_eq!(names, vec!["a.crate".to_string(), "b.crate".to_string()]);
    }

    #[tokio::test]
    async fn test_list_files_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_files(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::DirectoryNotFound { .. })
        ));
    }
}
