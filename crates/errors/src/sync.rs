//! Per-record synchronization error types

use std::borrow::Cow;

use crate::{NetworkError, UserFacingError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SyncError {
    #[error("cannot fetch {package} from {url}: {cause}")]
    FetchFailed {
        package: String,
        url: String,
        #[source]
        cause: NetworkError,
    },

    #[error("unexpected failure while processing {package}: {message}")]
    RecordFailed { package: String, message: String },

    #[error("worker panicked while processing {package}: {message}")]
    RecordPanicked { package: String, message: String },

    #[error("sync worker terminated abnormally: {message}")]
    WorkerFailed { message: String },
}

impl UserFacingError for SyncError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::FetchFailed { cause, .. } => cause.is_retryable(),
            Self::RecordFailed { .. } => true,
            Self::RecordPanicked { .. } | Self::WorkerFailed { .. } => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::FetchFailed { .. } => "sync.fetch_failed",
            Self::RecordFailed { .. } => "sync.record_failed",
            Self::RecordPanicked { .. } => "sync.record_panicked",
            Self::WorkerFailed { .. } => "sync.worker_failed",
        };
        Some(code)
    }
}
