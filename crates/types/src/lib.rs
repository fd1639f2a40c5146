#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the cmirror registry mirror
//!
//! This crate provides the types shared by every layer of the mirror:
//! artifact naming conventions, cache entry classification, and the
//! reports produced by synchronization and reconciliation passes.

pub mod artifact;
pub mod reports;

// Re-export commonly used types
pub use artifact::{is_path_safe, CacheEntryKind, PackageId};
pub use reports::{
    CleanupReport, RecordOutcome, RemovalReason, SyncReport, SyncStats, SyncStatus,
};

use serde::{Deserialize, Serialize};

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Auto
    }
}
