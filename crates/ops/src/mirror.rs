//! Creating mirror directories

use crate::{MirrorInfo, OpsCtx};
use cmirror_config::constants::INDEX_DIR;
use cmirror_errors::{Error, OpsError};
use cmirror_events::{EventEmitter, IndexEvent};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Create a new mirror directory and clone the index into it
///
/// # Errors
///
/// Returns an error if `dir` already exists, cannot be created, or the
/// index cannot be cloned.
pub async fn new_mirror(ctx: &OpsCtx, dir: &Path) -> Result<MirrorInfo, Error> {
    ctx.emit_operation_started("new");

    let exists = fs::try_exists(dir)
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?;
    if exists {
        return Err(OpsError::MirrorCreationFailed {
            path: dir.display().to_string(),
            reason: "it already exists".to_string(),
        }
        .into());
    }

    fs::create_dir_all(dir)
        .await
        .map_err(|e| OpsError::MirrorCreationFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

    let info = clone_index(ctx, dir).await?;
    ctx.emit_operation_completed("new", true);
    Ok(info)
}

/// Turn an existing directory into a mirror by cloning the index into it
///
/// # Errors
///
/// Returns an error if `dir` is missing, is not a directory, already holds
/// an index, or the index cannot be cloned.
pub async fn init_mirror(ctx: &OpsCtx, dir: &Path) -> Result<MirrorInfo, Error> {
    ctx.emit_operation_started("init");

    let refuse = |reason: String| -> Error {
        OpsError::MirrorInitFailed {
            path: dir.display().to_string(),
            reason,
        }
        .into()
    };

    let metadata = match fs::metadata(dir).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(refuse("it does not exist".to_string()));
        }
        Err(e) => return Err(Error::io_with_path(&e, dir)),
    };
    if !metadata.is_dir() {
        return Err(refuse("it is not a directory".to_string()));
    }

    let index = dir.join(INDEX_DIR);
    if fs::try_exists(&index)
        .await
        .map_err(|e| Error::io_with_path(&e, &index))?
    {
        return Err(refuse(format!("{} already exists", index.display())));
    }

    let info = clone_index(ctx, dir).await?;
    ctx.emit_operation_completed("init", true);
    Ok(info)
}

/// Index directory of an existing mirror
///
/// # Errors
///
/// Returns [`OpsError::InvalidMirror`] if `dir` has no index directory.
pub async fn require_index(dir: &Path) -> Result<PathBuf, Error> {
    let index = dir.join(INDEX_DIR);
    match fs::metadata(&index).await {
        Ok(metadata) if metadata.is_dir() => Ok(index),
        _ => Err(OpsError::InvalidMirror {
            path: dir.display().to_string(),
            reason: format!("no index directory at {}", index.display()),
        }
        .into()),
    }
}

async fn clone_index(ctx: &OpsCtx, dir: &Path) -> Result<MirrorInfo, Error> {
    let index = dir.join(INDEX_DIR);
    let url = ctx.config.registry.index_url.clone();

    ctx.emit_index(IndexEvent::CloneStarted {
        url: url.clone(),
        path: index.clone(),
    });
    ctx.refresher.clone_index(&url, &index).await?;
    ctx.emit_index(IndexEvent::CloneCompleted {
        path: index.clone(),
    });

    Ok(MirrorInfo {
        path: dir.to_path_buf(),
        index,
        index_url: url,
    })
}
