//! Lazy walk over an index tree

use crate::fs::{DiskIndexFs, IndexEntry, IndexFs};
use crate::models::{PackageVersionRecord, RegistryIndexConfig};
use cmirror_config::constants::INDEX_CONFIG_FILE;
use cmirror_errors::{Error, IndexError};
use cmirror_events::{EventEmitter, EventSender, IndexEvent};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Records buffered between the walker and its consumers
const RECORD_BUFFER: usize = 256;

/// Counts gathered by one walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub records: usize,
    /// Lines that could not be decoded
    pub rejected: usize,
    /// Files or directories that could not be read at all
    pub unreadable: usize,
}

impl ScanSummary {
    /// Whether every entry of the tree was read
    ///
    /// A rejected line is a bad record, not a gap in the snapshot; an
    /// unreadable entry may hide any number of records.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unreadable == 0
    }
}

/// Reads package version records from an index directory
///
/// Entries are visited depth-first in lexicographic order. Hidden entries
/// and the registry `config.json` at the root are skipped. A malformed line
/// or an unreadable entry is reported as an event and skipped; only a
/// missing or unreadable root fails the scan.
pub struct IndexReader<F = DiskIndexFs> {
    fs: Arc<F>,
    root: PathBuf,
    tx: Option<EventSender>,
}

impl IndexReader<DiskIndexFs> {
    /// Reader over an index on disk
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fs(DiskIndexFs, root)
    }
}

impl<F> EventEmitter for IndexReader<F> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl<F: IndexFs + 'static> IndexReader<F> {
    /// Reader over an arbitrary [`IndexFs`]
    pub fn with_fs(fs: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs: Arc::new(fs),
            root: root.into(),
            tx: None,
        }
    }

    /// Report rejected lines and unreadable entries on this channel
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a walk and return the lazy record sequence
    ///
    /// # Errors
    ///
    /// Returns an error if the index root is missing or cannot be listed.
    /// Nothing has been read from the tree at that point.
    pub async fn records(&self) -> Result<RecordStream, Error> {
        let top = self.open_root().await?;
        let (sender, receiver) = mpsc::channel(RECORD_BUFFER);

        let walker = Walker {
            fs: Arc::clone(&self.fs),
            root: self.root.clone(),
            tx: self.tx.clone(),
            sender,
        };
        let handle = tokio::spawn(walker.run(top));

        Ok(RecordStream { receiver, handle })
    }

    /// Read every record into memory, along with the walk's summary
    ///
    /// Check `ScanSummary::is_complete` before treating the records as the
    /// whole index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index root is missing or cannot be listed.
    pub async fn collect(&self) -> Result<(Vec<PackageVersionRecord>, ScanSummary), Error> {
        let mut stream = self.records().await?;
        let mut records = Vec::new();
        while let Some(record) = stream.next().await {
            records.push(record);
        }
        let summary = stream.finish().await?;
        Ok((records, summary))
    }

    /// Read the registry description at the index root, if present
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub async fn registry_config(&self) -> Result<Option<RegistryIndexConfig>, Error> {
        let path = self.root.join(INDEX_CONFIG_FILE);
        let contents = match self.fs.read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(IndexError::EntryUnreadable {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
                .into())
            }
        };

        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|e| {
                IndexError::EntryUnreadable {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
                .into()
            })
    }

    async fn open_root(&self) -> Result<Vec<IndexEntry>, Error> {
        self.fs.read_dir(&self.root).await.map_err(|e| {
            let path = self.root.display().to_string();
            if e.kind() == io::ErrorKind::NotFound {
                IndexError::RootMissing { path }.into()
            } else {
                IndexError::RootUnreadable {
                    path,
                    message: e.to_string(),
                }
                .into()
            }
        })
    }
}

/// Lazy sequence of records produced by a background walk
///
/// Dropping the stream stops the walk at the next record.
pub struct RecordStream {
    receiver: mpsc::Receiver<PackageVersionRecord>,
    handle: JoinHandle<ScanSummary>,
}

impl RecordStream {
    /// Next record, or `None` once the walk is over
    pub async fn next(&mut self) -> Option<PackageVersionRecord> {
        self.receiver.recv().await
    }

    /// Stop consuming and wait for the walk's summary
    ///
    /// # Errors
    ///
    /// Returns an error if the walker task panicked.
    pub async fn finish(self) -> Result<ScanSummary, Error> {
        drop(self.receiver);
        self.handle
            .await
            .map_err(|e| Error::internal(format!("index walker failed: {e}")))
    }
}

struct Walker<F> {
    fs: Arc<F>,
    root: PathBuf,
    tx: Option<EventSender>,
    sender: mpsc::Sender<PackageVersionRecord>,
}

impl<F> EventEmitter for Walker<F> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl<F: IndexFs> Walker<F> {
    async fn run(self, top: Vec<IndexEntry>) -> ScanSummary {
        self.emit_index(IndexEvent::ScanStarted {
            root: self.root.clone(),
        });

        let mut summary = ScanSummary::default();
        let mut stack = visible_children(top, true);

        while let Some(entry) = stack.pop() {
            if entry.is_dir {
                match self.fs.read_dir(&entry.path).await {
                    Ok(children) => stack.extend(visible_children(children, false)),
                    Err(e) => self.unreadable(&entry.path, &e, &mut summary),
                }
                continue;
            }

            let contents = match self.fs.read(&entry.path).await {
                Ok(contents) => contents,
                Err(e) => {
                    self.unreadable(&entry.path, &e, &mut summary);
                    continue;
                }
            };

            for (index, raw) in contents.split(|byte| *byte == b'\n').enumerate() {
                let line_no = index + 1;
                let parsed = std::str::from_utf8(raw)
                    .map_err(|e| format!("line is not valid UTF-8: {e}"))
                    .map(str::trim);
                let result = match parsed {
                    Ok("") => continue,
                    Ok(line) => PackageVersionRecord::parse_line(line, &entry.path, line_no)
                        .map_err(|e| e.to_string()),
                    Err(reason) => Err(reason),
                };

                match result {
                    Ok(record) => {
                        if self.sender.send(record).await.is_err() {
                            // Consumer went away
                            return summary;
                        }
                        summary.records += 1;
                    }
                    Err(reason) => {
                        summary.rejected += 1;
                        self.emit_index(IndexEvent::RecordRejected {
                            path: entry.path.clone(),
                            line: line_no,
                            reason,
                        });
                    }
                }
            }
        }

        self.emit_index(IndexEvent::ScanCompleted {
            root: self.root.clone(),
            records: summary.records,
            rejected: summary.rejected,
        });
        summary
    }

    fn unreadable(&self, path: &Path, error: &io::Error, summary: &mut ScanSummary) {
        summary.unreadable += 1;
        self.emit_index(IndexEvent::EntryUnreadable {
            path: path.to_path_buf(),
            reason: error.to_string(),
        });
    }
}

/// Children worth visiting, ordered so that popping from the end yields
/// them in lexicographic order
fn visible_children(mut entries: Vec<IndexEntry>, at_root: bool) -> Vec<IndexEntry> {
    entries.retain(|entry| {
        !entry.name.starts_with('.') && !(at_root && entry.name == INDEX_CONFIG_FILE)
    });
    entries.sort_by(|a, b| b.name.cmp(&a.name));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryIndexFs;

    fn line(name: &str, vers: &str, data: &[u8]) -> String {
        format!(
            r#"{{"name":"{name}","vers":"{vers}","deps":[],"cksum":"{}","features":{{}},"yanked":false}}"#,
            cmirror_hash::Hash::from_data(data).to_hex()
        )
    }

    #[tokio::test]
    async fn test_walk_order_and_skips() {
        let mut fs = MemoryIndexFs::new();
        fs.insert("/idx/config.json", r#"{"dl":"http://x"}"#);
        fs.insert("/idx/.git/HEAD", "ref: refs/heads/master");
        fs.insert("/idx/3/f/foo", line("foo", "1.0.0", b"foo"));
        fs.insert(
            "/idx/2/ab",
            format!("{}\n{}\n", line("ab", "0.1.0", b"a"), line("ab", "0.2.0", b"b")),
        );
        fs.insert("/idx/1/a", line("a", "1.0.0", b"x"));

        let reader = IndexReader::with_fs(fs, "/idx");
        let (records, summary) = reader.collect().await.unwrap();
        assert!(summary.is_complete());
        let ids: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["a-1.0.0", "ab-0.1.0", "ab-0.2.0", "foo-1.0.0"]);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let reader = IndexReader::with_fs(MemoryIndexFs::new(), "/nowhere");
        let Err(err) = reader.records().await else {
            panic!("expected scan error");
        };
        assert!(matches!(err, Error::Index(IndexError::RootMissing { .. })));
    }

    #[tokio::test]
    async fn test_registry_config() {
        let mut fs = MemoryIndexFs::new();
        fs.insert(
            "/idx/config.json",
            r#"{"dl":"https://example.com/{crate}/{version}","api":"https://example.com"}"#,
        );
        fs.insert("/idx/3/f/foo", "");
        let reader = IndexReader::with_fs(fs, "/idx");
        let config = reader.registry_config().await.unwrap().unwrap();
        assert_eq!(
            config.dl.as_deref(),
            Some("https://example.com/{crate}/{version}")
        );

        let mut fs = MemoryIndexFs::new();
        fs.insert("/idx/3/f/foo", "");
        let reader = IndexReader::with_fs(fs, "/idx");
        assert!(reader.registry_config().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_only_rejects_that_line() {
        let mut contents = line("foo", "1.0.0", b"one").into_bytes();
        contents.extend_from_slice(b"\n{\"name\":\"foo\xff\xfe\"}\n");
        contents.extend_from_slice(line("foo", "1.1.0", b"two").as_bytes());

        let mut fs = MemoryIndexFs::new();
        fs.insert("/idx/3/f/foo", contents);
        let (tx, mut rx) = cmirror_events::channel();
        let reader = IndexReader::with_fs(fs, "/idx").with_event_sender(tx);

        let (records, summary) = reader.collect().await.unwrap();
        let ids: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["foo-1.0.0", "foo-1.1.0"]);
        assert_eq!(summary.rejected, 1);
        assert!(summary.is_complete());

        let mut rejected = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let cmirror_events::AppEvent::Index(IndexEvent::RecordRejected { line, .. }) =
                message.event
            {
                rejected.push(line);
            }
        }
        assert_eq!(rejected, vec![2]);
    }

    #[tokio::test]
    async fn test_unreadable_entry_marks_scan_incomplete() {
        let mut fs = MemoryIndexFs::new();
        fs.insert("/idx/3/f/foo", line("foo", "1.0.0", b"foo"));
        fs.insert("/idx/3/b/bar", line("bar", "1.0.0", b"bar"));
        fs.deny("/idx/3/b/bar");

        let (records, summary) = IndexReader::with_fs(fs, "/idx").collect().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(summary.unreadable, 1);
        assert!(!summary.is_complete());
    }
}
