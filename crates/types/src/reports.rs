//! Report types for synchronization and reconciliation passes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Terminal state of one record in a synchronization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Committed artifact already present with the expected checksum
    UpToDate,
    /// Artifact fetched, verified and committed
    Downloaded,
    /// Network or transport failure; nothing committed
    FetchFailed,
    /// Fetched payload did not match the checksum and was quarantined
    Corrupt,
    /// Unexpected local failure while processing the record
    Failed,
    /// Processing abandoned because the pass was cancelled
    Aborted,
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UpToDate => "up-to-date",
            Self::Downloaded => "downloaded",
            Self::FetchFailed => "fetch-failed",
            Self::Corrupt => "corrupt",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Aggregate counts of record outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub up_to_date: usize,
    pub downloaded: usize,
    /// Fetch failures and unexpected per-record failures
    pub failed: usize,
    pub corrupt: usize,
    /// Records whose processing was abandoned after cancellation
    #[serde(default, skip_serializing_if = "is_zero")]
    pub aborted: usize,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl SyncStats {
    /// Count one record outcome
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::UpToDate => self.up_to_date += 1,
            RecordOutcome::Downloaded => self.downloaded += 1,
            RecordOutcome::FetchFailed | RecordOutcome::Failed => self.failed += 1,
            RecordOutcome::Corrupt => self.corrupt += 1,
            RecordOutcome::Aborted => self.aborted += 1,
        }
    }

    /// Number of records that reached a terminal state
    #[must_use]
    pub fn processed(&self) -> usize {
        self.up_to_date + self.downloaded + self.failed + self.corrupt + self.aborted
    }

    /// Whether any record ended in a failure state
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.corrupt > 0
    }
}

impl AddAssign for SyncStats {
    fn add_assign(&mut self, other: Self) {
        self.up_to_date += other.up_to_date;
        self.downloaded += other.downloaded;
        self.failed += other.failed;
        self.corrupt += other.corrupt;
        self.aborted += other.aborted;
    }
}

/// Final status of a synchronization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Completed,
    Aborted,
}

/// Result of one synchronization pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub status: SyncStatus,
    pub stats: SyncStats,
    /// Number of workers used for the pass
    pub jobs: usize,
    pub duration_ms: u64,
}

impl SyncReport {
    /// Whether the pass ran to completion
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == SyncStatus::Completed
    }
}

/// Why a cache entry was removed during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Committed artifact whose record is no longer in the index
    Stale,
    /// Leftover in-progress download
    Partial,
    /// Quarantined download that failed verification
    Quarantined,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stale => "stale artifact",
            Self::Partial => "partial download",
            Self::Quarantined => "corrupted download",
        };
        f.write_str(label)
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub stale_removed: usize,
    pub partial_removed: usize,
    pub quarantined_removed: usize,
    /// Entries that matched a removal rule but could not be deleted
    pub errors: usize,
    /// Committed artifacts kept because the index still references them
    pub kept: usize,
    /// Unreferenced artifacts left alone because the index could not be
    /// read completely
    #[serde(default, skip_serializing_if = "is_zero")]
    pub stale_skipped: usize,
}

impl CleanupReport {
    /// Count one removal
    pub fn record_removal(&mut self, reason: RemovalReason) {
        match reason {
            RemovalReason::Stale => self.stale_removed += 1,
            RemovalReason::Partial => self.partial_removed += 1,
            RemovalReason::Quarantined => self.quarantined_removed += 1,
        }
    }

    /// Total number of removed entries
    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.stale_removed + self.partial_removed + self.quarantined_removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counting() {
        let mut stats = SyncStats::default();
        stats.record(RecordOutcome::Downloaded);
        stats.record(RecordOutcome::FetchFailed);
        stats.record(RecordOutcome::Failed);
        stats.record(RecordOutcome::UpToDate);

        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.processed(), 4);
        assert!(stats.has_failures());

        let mut total = SyncStats::default();
        total += stats;
        total += stats;
        assert_eq!(total.failed, 4);
    }

    #[test]
    fn test_stats_serialization_omits_zero_aborted() {
        let stats = SyncStats {
            downloaded: 1,
            ..SyncStats::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(
            json,
            r#"{"up_to_date":0,"downloaded":1,"failed":0,"corrupt":0}"#
        );
    }
}
