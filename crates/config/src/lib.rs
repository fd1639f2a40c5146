#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for cmirror
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/cmirror/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod core;

pub use self::core::{GeneralConfig, NetworkConfig, RegistryConfig};

use cmirror_errors::{ConfigError, Error};
use cmirror_types::ColorChoice;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("cmirror").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_from(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value of the wrong shape.
    pub fn merge_from<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // CMIRROR_JOBS
        if let Some(jobs) = lookup("CMIRROR_JOBS") {
            self.general.jobs = jobs.parse().map_err(|_| ConfigError::InvalidValue {
                field: "CMIRROR_JOBS".to_string(),
                value: jobs,
            })?;
        }

        // CMIRROR_COLOR
        if let Some(color) = lookup("CMIRROR_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "CMIRROR_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // CMIRROR_INDEX_URL
        if let Some(url) = lookup("CMIRROR_INDEX_URL") {
            self.registry.index_url = non_empty("CMIRROR_INDEX_URL", url)?;
        }

        // CMIRROR_DOWNLOAD_URL
        if let Some(url) = lookup("CMIRROR_DOWNLOAD_URL") {
            self.registry.download_url = Some(non_empty("CMIRROR_DOWNLOAD_URL", url)?);
        }

        // CMIRROR_USER_AGENT
        if let Some(agent) = lookup("CMIRROR_USER_AGENT") {
            self.network.user_agent = non_empty("CMIRROR_USER_AGENT", agent)?;
        }

        Ok(())
    }

    /// Number of synchronization workers after resolving the auto value
    #[must_use]
    pub fn jobs(&self) -> usize {
        calculate_jobs(self.general.jobs)
    }
}

fn non_empty(field: &str, value: String) -> Result<String, Error> {
    if value.trim().is_empty() {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into())
    } else {
        Ok(value)
    }
}

/// Resolve a worker count, 0 meaning one worker per CPU
#[must_use]
pub fn calculate_jobs(config_value: usize) -> usize {
    if config_value > 0 {
        config_value // User override
    } else {
        num_cpus::get().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.general.jobs, 0);
        assert_eq!(config.network.retries, 0);
        assert_eq!(config.network.user_agent, "cargo");
        assert_eq!(config.registry.index_url, constants::DEFAULT_INDEX_URL);
        assert!(config.registry.download_url.is_none());
        assert!(config.jobs() >= 1);
    }

    #[test]
    fn test_merge_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("CMIRROR_JOBS", "3"),
            ("CMIRROR_DOWNLOAD_URL", "http://localhost/{crate}/{version}"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .merge_from(|key| vars.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.jobs(), 3);
        assert_eq!(
            config.registry.download_url.as_deref(),
            Some("http://localhost/{crate}/{version}")
        );
    }

    #[test]
    fn test_merge_rejects_bad_jobs() {
        let mut config = Config::default();
        let err = config
            .merge_from(|key| (key == "CMIRROR_JOBS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_merge_rejects_empty_user_agent() {
        let mut config = Config::default();
        assert!(config
            .merge_from(|key| (key == "CMIRROR_USER_AGENT").then(String::new))
            .is_err());
    }
}
