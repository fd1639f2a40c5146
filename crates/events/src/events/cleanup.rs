use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use cmirror_types::{CleanupReport, RemovalReason};

/// Cache reconciliation events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CleanupEvent {
    Started { cache_dir: PathBuf },

    /// One cache entry was deleted
    EntryRemoved { path: PathBuf, reason: RemovalReason },

    /// A cache entry matched a removal rule but could not be deleted
    RemovalFailed {
        path: PathBuf,
        reason: RemovalReason,
        error: String,
    },

    Completed { report: CleanupReport },
}
