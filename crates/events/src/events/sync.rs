use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use cmirror_types::{PackageId, SyncStats};

use super::FailureContext;

/// Per-record synchronization events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// A synchronization pass started
    Started { cache_dir: PathBuf, jobs: usize },

    /// Committed artifact already matches its checksum
    RecordUpToDate { package: PackageId },

    /// Committed artifact did not match its checksum and was deleted
    StaleArtifactReplaced {
        package: PackageId,
        expected: String,
        actual: String,
        failure: FailureContext,
    },

    FetchStarted { package: PackageId, url: String },

    /// Artifact fetched, verified and committed
    Downloaded { package: PackageId, bytes: u64 },

    FetchFailed {
        package: PackageId,
        url: String,
        failure: FailureContext,
    },

    /// Fetched payload did not match the checksum and was quarantined
    Corrupt {
        package: PackageId,
        expected: String,
        actual: String,
        quarantined: PathBuf,
        failure: FailureContext,
    },

    /// Unexpected failure confined to one record
    RecordFailed {
        package: PackageId,
        failure: FailureContext,
    },

    /// The pass was interrupted before every record was processed
    Aborted { stats: SyncStats },

    Completed { stats: SyncStats, duration_ms: u64 },
}

impl SyncEvent {
    /// Record this event refers to, if any
    #[must_use]
    pub fn package(&self) -> Option<&PackageId> {
        match self {
            Self::RecordUpToDate { package }
            | Self::StaleArtifactReplaced { package, .. }
            | Self::FetchStarted { package, .. }
            | Self::Downloaded { package, .. }
            | Self::FetchFailed { package, .. }
            | Self::Corrupt { package, .. }
            | Self::RecordFailed { package, .. } => Some(package),
            Self::Started { .. } | Self::Aborted { .. } | Self::Completed { .. } => None,
        }
    }
}
