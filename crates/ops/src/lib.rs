#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for cmirror
//!
//! This crate sits between the CLI and the library crates. Each command
//! (`new`, `init`, `update`, `cleanup`, `install`) is one async function
//! taking an [`OpsCtx`].

mod context;
mod install;
mod maintenance;
mod mirror;
mod types;
mod update;

pub use context::{OpsContextBuilder, OpsCtx};
pub use install::install;
pub use maintenance::cleanup;
pub use mirror::{init_mirror, new_mirror, require_index};
pub use types::{InstallReport, InstallTarget, MirrorInfo, UpdateOptions};
pub use update::update;

use cmirror_errors::Error;
use cmirror_types::{CleanupReport, SyncReport};

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Mirror created or initialized
    Mirror(MirrorInfo),
    SyncReport(SyncReport),
    CleanupReport(CleanupReport),
    InstallReport(InstallReport),
    /// Generic success message
    Success(String),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the result cannot be serialized.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            cmirror_errors::OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Check if this is a success result
    ///
    /// A pass that ran to completion is a success even when some records
    /// failed; only an interrupted pass is not. A cleanup is not a success
    /// when it could not remove an entry or had to keep unreferenced
    /// artifacts because the index was unreadable.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::Mirror(_)
            | OperationResult::InstallReport(_)
            | OperationResult::Success(_) => true,
            OperationResult::SyncReport(report) => report.is_completed(),
            OperationResult::CleanupReport(report) => {
                report.errors == 0 && report.stale_skipped == 0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmirror_types::{SyncStats, SyncStatus};

    #[test]
    fn test_aborted_pass_is_not_success() {
        let report = SyncReport {
            status: SyncStatus::Aborted,
            stats: SyncStats::default(),
            jobs: 2,
            duration_ms: 5,
        };
        assert!(!OperationResult::SyncReport(report).is_success());
    }

    #[test]
    fn test_incomplete_cleanup_is_not_success() {
        let report = CleanupReport {
            stale_skipped: 1,
            ..CleanupReport::default()
        };
        assert!(!OperationResult::CleanupReport(report).is_success());
        assert!(OperationResult::CleanupReport(CleanupReport::default()).is_success());
    }

    #[test]
    fn test_json_is_tagged() {
        let json = OperationResult::CleanupReport(CleanupReport::default())
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "CleanupReport");
        assert_eq!(value["data"]["stale_removed"], 0);
    }
}
