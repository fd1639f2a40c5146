//! Command-level error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum OpsError {
    #[error("invalid mirror at {path}: {reason}")]
    InvalidMirror { path: String, reason: String },

    #[error("cannot create mirror in {path}: {reason}")]
    MirrorCreationFailed { path: String, reason: String },

    #[error("cannot initialize mirror in {path}: {reason}")]
    MirrorInitFailed { path: String, reason: String },

    #[error("missing component: {component}")]
    MissingComponent { component: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidMirror { .. } => {
                Some("Point the command at a mirror created by `cmirror new` or `cmirror init`.")
            }
            Self::MirrorCreationFailed { .. } => {
                Some("Choose a directory that does not exist yet, or use `cmirror init`.")
            }
            Self::MirrorInitFailed { .. } => {
                Some("Use an existing directory that does not already contain an index.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidMirror { .. } => "ops.invalid_mirror",
            Self::MirrorCreationFailed { .. } => "ops.mirror_creation_failed",
            Self::MirrorInitFailed { .. } => "ops.mirror_init_failed",
            Self::MissingComponent { .. } => "ops.missing_component",
            Self::SerializationError { .. } => "ops.serialization_error",
        };
        Some(code)
    }
}
