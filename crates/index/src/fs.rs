//! Filesystem access used by the index walker

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// One child of an index directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Read-only view of an index tree
#[async_trait]
pub trait IndexFs: Send + Sync {
    /// List the children of a directory, in no particular order
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<IndexEntry>>;

    /// Read a whole metadata file as raw bytes
    ///
    /// Lines are decoded one by one, so a file is never rejected as a whole
    /// for containing invalid UTF-8.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskIndexFs;

#[async_trait]
impl IndexFs for DiskIndexFs {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<IndexEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(path).await?;
        while let Some(entry) = dir.next_entry().await? {
            // Non UTF-8 names cannot be package names
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let is_dir = entry.file_type().await?.is_dir();
            entries.push(IndexEntry {
                name,
                path: entry.path(),
                is_dir,
            });
        }
        Ok(entries)
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path).await
    }
}

/// In-memory index tree, keyed by file path
///
/// Directories are implied by the files beneath them.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
    unreadable: BTreeSet<PathBuf>,
}

impl MemoryIndexFs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Make reads and listings of `path` fail with `PermissionDenied`
    pub fn deny(&mut self, path: impl Into<PathBuf>) {
        self.unreadable.insert(path.into());
    }

    fn check_access(&self, path: &Path) -> io::Result<()> {
        if self.unreadable.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

#[async_trait]
impl IndexFs for MemoryIndexFs {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<IndexEntry>> {
        self.check_access(path)?;
        if !self.is_dir(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }

        let mut children: BTreeMap<String, IndexEntry> = BTreeMap::new();
        for file in self.files.keys() {
            let Ok(rest) = file.strip_prefix(path) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().into_owned();
            let is_dir = components.next().is_some();
            children.entry(name.clone()).or_insert_with(|| IndexEntry {
                path: path.join(&name),
                name,
                is_dir,
            });
        }
        Ok(children.into_values().collect())
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.check_access(path)?;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}
