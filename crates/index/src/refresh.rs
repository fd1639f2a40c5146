//! Keeping the local index checkout in step with upstream

use async_trait::async_trait;
use cmirror_config::constants::INDEX_BRANCH;
use cmirror_errors::{Error, IndexError};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Brings an index checkout up to date
#[async_trait]
pub trait IndexRefresher: Send + Sync {
    /// Create a fresh checkout of `url` at `dest`
    async fn clone_index(&self, url: &str, dest: &Path) -> Result<(), Error>;

    /// Update the checkout at `index_dir` to the upstream head
    async fn refresh(&self, index_dir: &Path) -> Result<(), Error>;
}

/// Refresher driving the `git` command line tool
#[derive(Debug, Clone)]
pub struct GitIndex {
    program: PathBuf,
    branch: String,
}

impl Default for GitIndex {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
            branch: INDEX_BRANCH.to_string(),
        }
    }
}

impl GitIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    async fn git(&self, cwd: Option<&Path>, args: &[&str]) -> Result<(), String> {
        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|e| format!("cannot run {}: {e}", self.program.display()))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!(
                "git {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            ))
        }
    }
}

#[async_trait]
impl IndexRefresher for GitIndex {
    async fn clone_index(&self, url: &str, dest: &Path) -> Result<(), Error> {
        let dest_str = dest.to_string_lossy();
        self.git(None, &["clone", "--depth", "1", url, &dest_str])
            .await
            .map_err(|message| {
                IndexError::CloneFailed {
                    path: dest.display().to_string(),
                    message,
                }
                .into()
            })
    }

    async fn refresh(&self, index_dir: &Path) -> Result<(), Error> {
        let upstream = format!("origin/{}", self.branch);
        let refresh_failed = |message: String| -> Error {
            IndexError::RefreshFailed {
                path: index_dir.display().to_string(),
                message,
            }
            .into()
        };

        self.git(Some(index_dir), &["fetch", "origin", &self.branch])
            .await
            .map_err(refresh_failed)?;
        self.git(Some(index_dir), &["reset", "--hard", &upstream])
            .await
            .map_err(refresh_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_refresh_error() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitIndex::new().with_program(dir.path().join("no-such-git"));

        let err = git.refresh(dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Index(IndexError::RefreshFailed { .. })
        ));

        let err = git
            .clone_index("https://example.invalid/index", &dir.path().join("index"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Index(IndexError::CloneFailed { .. })));
    }
}
