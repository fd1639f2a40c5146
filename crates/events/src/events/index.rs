use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Index refresh and scan events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IndexEvent {
    /// Refreshing the local index checkout from upstream
    RefreshStarted { path: PathBuf },

    RefreshCompleted { path: PathBuf },

    /// Refresh was skipped (offline run)
    RefreshSkipped { path: PathBuf },

    RefreshFailed {
        path: PathBuf,
        failure: FailureContext,
    },

    /// Cloning a fresh index checkout
    CloneStarted { url: String, path: PathBuf },

    CloneCompleted { path: PathBuf },

    /// Walking the index tree
    ScanStarted { root: PathBuf },

    ScanCompleted {
        root: PathBuf,
        records: usize,
        rejected: usize,
    },

    /// One metadata line could not be decoded and was skipped
    RecordRejected {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A file or directory inside the index could not be read and was skipped
    EntryUnreadable { path: PathBuf, reason: String },
}
