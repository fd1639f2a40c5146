//! Configuration sections

use super::constants;
use cmirror_types::ColorChoice;
use serde::{Deserialize, Serialize};

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Number of synchronization workers, 0 = one per CPU
    #[serde(default)]
    pub jobs: usize,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            color: ColorChoice::Auto,
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    /// Maximum silence between two body chunks
    #[serde(default = "default_chunk_timeout")]
    pub chunk_timeout: u64, // seconds
    /// Request retries for transport errors, 0 = a failed fetch waits for the next pass
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            chunk_timeout: default_chunk_timeout(),
            retries: 0,
            retry_delay: default_retry_delay(),
            user_agent: default_user_agent(),
        }
    }
}

/// Upstream registry locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_index_url")]
    pub index_url: String,
    /// Download URL template; when unset the index `config.json` decides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            download_url: None,
        }
    }
}

// Default value functions for serde
fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_chunk_timeout() -> u64 {
    60
}

fn default_retry_delay() -> u64 {
    1 // 1 second
}

fn default_user_agent() -> String {
    constants::DEFAULT_USER_AGENT.to_string()
}

fn default_index_url() -> String {
    constants::DEFAULT_INDEX_URL.to_string()
}
