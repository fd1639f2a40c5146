//! Types for operations and results

use cmirror_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A mirror directory with a fresh index checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorInfo {
    pub path: PathBuf,
    pub index: PathBuf,
    /// Upstream the index was cloned from
    pub index_url: String,
}

/// Options of an update pass
#[derive(Clone, Debug, Default)]
pub struct UpdateOptions {
    /// Worker count; `None` or `Some(0)` uses the configured value
    pub jobs: Option<usize>,
    /// Skip refreshing the index from upstream
    pub offline: bool,
}

/// Where `install` puts the cargo source replacement
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallTarget {
    /// Only print the snippet
    Print,
    /// `$CARGO_HOME/config.toml`, `~/.cargo/config.toml` by default
    Global,
    /// `.cargo/config.toml` under the current directory
    Local,
    File(PathBuf),
}

impl InstallTarget {
    /// Cargo configuration file to edit, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the global target is requested and no home
    /// directory can be determined.
    pub fn config_path(&self) -> Result<Option<PathBuf>, Error> {
        match self {
            Self::Print => Ok(None),
            Self::Global => {
                let cargo_home = match std::env::var_os("CARGO_HOME") {
                    Some(home) if !home.is_empty() => PathBuf::from(home),
                    _ => dirs::home_dir()
                        .ok_or_else(|| ConfigError::Invalid {
                            message: "cannot determine the home directory".to_string(),
                        })?
                        .join(".cargo"),
                };
                Ok(Some(cargo_home.join("config.toml")))
            }
            Self::Local => Ok(Some(PathBuf::from(".cargo").join("config.toml"))),
            Self::File(path) => Ok(Some(path.clone())),
        }
    }
}

/// What `install` did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    /// Absolute mirror directory registered with cargo
    pub mirror: PathBuf,
    /// Configuration file that was written, or `None` when only printing
    pub config_file: Option<PathBuf>,
    /// Source replacement in cargo configuration syntax
    pub snippet: String,
}
