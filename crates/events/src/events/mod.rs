use serde::{Deserialize, Serialize};

use crate::EventSource;
use cmirror_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, e.g. `network.timeout`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod cleanup;
pub mod general;
pub mod index;
pub mod sync;

pub use cleanup::*;
pub use general::*;
pub use index::*;
pub use sync::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Index refresh and scan events
    Index(IndexEvent),

    /// Per-record synchronization events
    Sync(SyncEvent),

    /// Cache reconciliation events
    Cleanup(CleanupEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Index(_) => EventSource::INDEX,
            Self::Sync(_) => EventSource::SYNC,
            Self::Cleanup(_) => EventSource::CLEANUP,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            // Error-level events
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Index(IndexEvent::RefreshFailed { .. })
            | Self::Sync(
                SyncEvent::FetchFailed { .. }
                | SyncEvent::Corrupt { .. }
                | SyncEvent::RecordFailed { .. },
            ) => Level::ERROR,

            // Warning-level events
            Self::General(GeneralEvent::Warning { .. })
            | Self::Index(IndexEvent::RecordRejected { .. } | IndexEvent::EntryUnreadable { .. })
            | Self::Sync(SyncEvent::StaleArtifactReplaced { .. } | SyncEvent::Aborted { .. })
            | Self::Cleanup(CleanupEvent::RemovalFailed { .. }) => Level::WARN,

            // Debug-level events (per-record chatter)
            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Sync(SyncEvent::RecordUpToDate { .. } | SyncEvent::FetchStarted { .. }) => {
                Level::DEBUG
            }

            _ => Level::INFO,
        }
    }

    /// Record identity this event refers to, if any
    #[must_use]
    pub fn correlation(&self) -> Option<String> {
        match self {
            Self::Sync(event) => event.package().map(ToString::to_string),
            _ => None,
        }
    }
}
