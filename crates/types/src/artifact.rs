//! Artifact naming conventions for the cache directory
//!
//! Every file the mirror writes into the cache directory is named from the
//! `(name, version)` pair of its record. Three shapes exist:
//!
//! - `<name>-<version>.crate`: committed artifact, verified on commit
//! - `<name>-<version>.crate~`: download in progress
//! - `<name>-<version>.crate~corrupted`: complete download that failed verification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extension of committed artifacts
pub const ARTIFACT_EXTENSION: &str = ".crate";

/// Suffix appended to the artifact name while it is being downloaded
pub const PARTIAL_SUFFIX: &str = "~";

/// Suffix appended to the artifact name when its checksum did not match
pub const QUARANTINE_SUFFIX: &str = "~corrupted";

/// Identity of one package version within an index snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    /// Create a new package ID
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Canonical file name of the committed artifact
    #[must_use]
    pub fn artifact_file_name(&self) -> String {
        format!("{}-{}{ARTIFACT_EXTENSION}", self.name, self.version)
    }

    /// File name used while the artifact is being downloaded
    #[must_use]
    pub fn partial_file_name(&self) -> String {
        format!("{}{PARTIAL_SUFFIX}", self.artifact_file_name())
    }

    /// File name used for a download that failed checksum verification
    #[must_use]
    pub fn quarantine_file_name(&self) -> String {
        format!("{}{QUARANTINE_SUFFIX}", self.artifact_file_name())
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// Whether a name or version can be used as part of a file name
///
/// Rejects empty strings, hidden names, relative components and anything
/// containing a path separator or NUL byte.
#[must_use]
pub fn is_path_safe(component: &str) -> bool {
    !component.is_empty()
        && !component.starts_with('.')
        && !component.contains(['/', '\\', '\0'])
}

/// Classification of a file found in the cache directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEntryKind {
    /// Looks like `<name>-<version>.crate`
    Committed,
    /// Looks like `<name>-<version>.crate~`
    Partial,
    /// Looks like `<name>-<version>.crate~corrupted`
    Quarantined,
    /// Anything else (the index directory, operator files, hidden files)
    Unrelated,
}

impl CacheEntryKind {
    /// Classify a cache directory entry by its file name
    #[must_use]
    pub fn classify(file_name: &str) -> Self {
        if file_name.starts_with('.') {
            return Self::Unrelated;
        }

        let quarantine = format!("{ARTIFACT_EXTENSION}{QUARANTINE_SUFFIX}");
        let partial = format!("{ARTIFACT_EXTENSION}{PARTIAL_SUFFIX}");

        if has_stem_with_suffix(file_name, &quarantine) {
            Self::Quarantined
        } else if has_stem_with_suffix(file_name, &partial) {
            Self::Partial
        } else if has_stem_with_suffix(file_name, ARTIFACT_EXTENSION) {
            Self::Committed
        } else {
            Self::Unrelated
        }
    }
}

fn has_stem_with_suffix(file_name: &str, suffix: &str) -> bool {
    file_name.len() > suffix.len() && file_name.ends_with(suffix)
}
