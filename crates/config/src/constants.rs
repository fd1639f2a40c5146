//! Fixed, non-configurable layout of a mirror directory
//!
//! Package tools read a local registry by these names, so they are not
//! exposed via TOML configuration.

/// Subdirectory of the mirror holding the index checkout
pub const INDEX_DIR: &str = "index";

/// Reserved file at the index root describing the registry
pub const INDEX_CONFIG_FILE: &str = "config.json";

/// Upstream git repository of the registry index
pub const DEFAULT_INDEX_URL: &str = "https://github.com/rust-lang/crates.io-index";

/// Base of the upstream artifact API; `/{crate}/{version}/download` is appended
pub const DEFAULT_DOWNLOAD_URL: &str = "https://crates.io/api/v1/crates";

/// Branch tracked by index refreshes
pub const INDEX_BRANCH: &str = "master";

/// Name under which the mirror is registered in cargo configuration
pub const SOURCE_NAME: &str = "local-mirror";

/// User agent the upstream registry expects from download clients
pub const DEFAULT_USER_AGENT: &str = "cargo";
