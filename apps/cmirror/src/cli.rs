//! Command line interface definition

use clap::{ArgGroup, Parser, Subcommand};
use cmirror_ops::InstallTarget;
use cmirror_types::ColorChoice;
use std::path::PathBuf;

/// cmirror - local, verified mirror of the crates.io registry
#[derive(Parser)]
#[command(name = "cmirror")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A tool to make and keep up-to-date a crates.io mirror")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Display more information
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Display debug information
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new mirror
    New {
        /// Output directory for the mirror (must not exist)
        dir: PathBuf,
    },

    /// Initialize a mirror in an existing directory
    Init {
        /// Output directory for the mirror
        dir: PathBuf,
    },

    /// Update a mirror
    Update {
        /// Mirror directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Parallelize downloads over N jobs (0 or no value = CPU count)
        #[arg(
            short = 'j',
            long = "parallel",
            alias = "jobs",
            value_name = "N",
            num_args = 0..=1,
            default_missing_value = "0"
        )]
        jobs: Option<usize>,

        /// Do not refresh the index from upstream
        #[arg(long)]
        offline: bool,
    },

    /// Remove stale artifacts and leftover downloads
    Cleanup {
        /// Mirror directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Register the mirror with cargo
    #[command(group(ArgGroup::new("target").args(["global", "local", "config_file"])))]
    Install {
        /// Mirror directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Set cargo config globally (~/.cargo/config.toml)
        #[arg(long)]
        global: bool,

        /// Set cargo config locally (.cargo/config.toml in the current directory)
        #[arg(long)]
        local: bool,

        /// Set up the mirror in a custom cargo config file
        #[arg(long, value_name = "PATH")]
        config_file: Option<PathBuf>,
    },
}

/// Where `install` writes, printing only when no target flag is given
pub fn install_target(global: bool, local: bool, config_file: Option<PathBuf>) -> InstallTarget {
    match (global, local, config_file) {
        (_, _, Some(path)) => InstallTarget::File(path),
        (true, _, None) => InstallTarget::Global,
        (false, true, None) => InstallTarget::Local,
        (false, false, None) => InstallTarget::Print,
    }
}
