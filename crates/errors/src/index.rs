//! Index scanning and refresh error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum IndexError {
    #[error("index root not found: {path}")]
    RootMissing { path: String },

    #[error("index root unreadable: {path}: {message}")]
    RootUnreadable { path: String, message: String },

    #[error("cannot read index entry {path}: {message}")]
    EntryUnreadable { path: String, message: String },

    #[error("malformed record in {path} line {line}: {message}")]
    RecordParse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("invalid {field} in index record: {value:?}")]
    InvalidRecordField { field: String, value: String },

    #[error("index refresh failed for {path}: {message}")]
    RefreshFailed { path: String, message: String },

    #[error("index clone failed into {path}: {message}")]
    CloneFailed { path: String, message: String },
}

impl UserFacingError for IndexError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::RootMissing { .. } => {
                Some("Create the mirror with `cmirror new` or `cmirror init` first.")
            }
            Self::RootUnreadable { .. } => Some("Check the permissions of the index directory."),
            Self::RefreshFailed { .. } | Self::CloneFailed { .. } => {
                Some("Make sure git is installed and the index remote is reachable.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::RefreshFailed { .. } | Self::CloneFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::RootMissing { .. } => "index.root_missing",
            Self::RootUnreadable { .. } => "index.root_unreadable",
            Self::EntryUnreadable { .. } => "index.entry_unreadable",
            Self::RecordParse { .. } => "index.record_parse",
            Self::InvalidRecordField { .. } => "index.invalid_record_field",
            Self::RefreshFailed { .. } => "index.refresh_failed",
            Self::CloneFailed { .. } => "index.clone_failed",
        };
        Some(code)
    }
}
