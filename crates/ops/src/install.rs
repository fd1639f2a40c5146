//! Registering a mirror with cargo

use crate::mirror::require_index;
use crate::{InstallReport, InstallTarget, OpsCtx};
use cmirror_config::constants::SOURCE_NAME;
use cmirror_errors::{ConfigError, Error};
use cmirror_events::EventEmitter;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use toml::{Table, Value};

const UPSTREAM_SOURCE: &str = "crates-io";

/// Configure cargo to replace the upstream registry with the mirror at `dir`
///
/// With [`InstallTarget::Print`] nothing is written and the report carries
/// the snippet to paste. Otherwise the snippet is merged into the target
/// file; unrelated keys are kept and missing parent directories created.
///
/// # Errors
///
/// Returns an error if the mirror path cannot be made absolute, or the
/// configuration file cannot be read, parsed or written.
pub async fn install(
    ctx: &OpsCtx,
    dir: &Path,
    target: &InstallTarget,
) -> Result<InstallReport, Error> {
    ctx.emit_operation_started("install");

    let mirror = std::path::absolute(dir).map_err(|e| Error::io_with_path(&e, dir))?;
    if require_index(&mirror).await.is_err() {
        ctx.emit_warning_with_context(
            format!("{} has no index yet", mirror.display()),
            "run `cmirror init` or `cmirror new` before using the mirror",
        );
    }

    let snippet = toml::to_string(&source_replacement(&mirror))?;

    let config_file = match target.config_path()? {
        None => None,
        Some(path) => {
            merge_into(&path, &mirror).await?;
            Some(path)
        }
    };

    ctx.emit_operation_completed("install", true);
    Ok(InstallReport {
        mirror,
        config_file,
        snippet,
    })
}

/// `[source]` table replacing crates.io with the mirror
fn source_replacement(mirror: &Path) -> Table {
    let mut upstream = Table::new();
    upstream.insert(
        "replace-with".to_string(),
        Value::String(SOURCE_NAME.to_string()),
    );

    let mut local = Table::new();
    local.insert(
        "local-registry".to_string(),
        Value::String(mirror.display().to_string()),
    );

    let mut sources = Table::new();
    sources.insert(UPSTREAM_SOURCE.to_string(), Value::Table(upstream));
    sources.insert(SOURCE_NAME.to_string(), Value::Table(local));

    let mut root = Table::new();
    root.insert("source".to_string(), Value::Table(sources));
    root
}

async fn merge_into(path: &Path, mirror: &Path) -> Result<(), Error> {
    let mut config = match fs::read_to_string(path).await {
        Ok(contents) => contents.parse::<Table>()?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Table::new(),
        Err(e) => return Err(Error::io_with_path(&e, path)),
    };

    let sources = table_entry(&mut config, "source", path)?;

    let upstream = table_entry(sources, UPSTREAM_SOURCE, path)?;
    upstream.insert(
        "replace-with".to_string(),
        Value::String(SOURCE_NAME.to_string()),
    );

    let mut local = Table::new();
    local.insert(
        "local-registry".to_string(),
        Value::String(mirror.display().to_string()),
    );
    sources.insert(SOURCE_NAME.to_string(), Value::Table(local));

    let contents = toml::to_string(&config)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| write_error(parent.to_path_buf(), &e))?;
    }
    fs::write(path, contents)
        .await
        .map_err(|e| write_error(path.to_path_buf(), &e))?;
    Ok(())
}

/// Table under `key`, created if absent
fn table_entry<'a>(table: &'a mut Table, key: &str, path: &Path) -> Result<&'a mut Table, Error> {
    let entry = table
        .entry(key.to_string())
        .or_insert_with(|| Value::Table(Table::new()));
    entry.as_table_mut().ok_or_else(|| {
        ConfigError::Invalid {
            message: format!("`{key}` in {} is not a table", path.display()),
        }
        .into()
    })
}

fn write_error(path: PathBuf, error: &io::Error) -> Error {
    ConfigError::WriteError {
        path: path.display().to_string(),
        error: error.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_shape() {
        let snippet = toml::to_string(&source_replacement(Path::new("/srv/mirror"))).unwrap();
        let parsed: Table = snippet.parse().unwrap();
        assert_eq!(
            parsed["source"]["crates-io"]["replace-with"].as_str(),
            Some("local-mirror")
        );
        assert_eq!(
            parsed["source"]["local-mirror"]["local-registry"].as_str(),
            Some("/srv/mirror")
        );
    }

    #[tokio::test]
    async fn test_merge_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[build]\njobs = 4\n\n[source.crates-io]\nregistry = \"sparse+https://index.crates.io/\"\n",
        )
        .await
        .unwrap();

        merge_into(&path, Path::new("/srv/mirror")).await.unwrap();

        let merged: Table = fs::read_to_string(&path).await.unwrap().parse().unwrap();
        assert_eq!(merged["build"]["jobs"].as_integer(), Some(4));
        assert_eq!(
            merged["source"]["crates-io"]["registry"].as_str(),
            Some("sparse+https://index.crates.io/")
        );
        assert_eq!(
            merged["source"]["crates-io"]["replace-with"].as_str(),
            Some("local-mirror")
        );
    }

    #[tokio::test]
    async fn test_merge_rejects_non_table_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "source = 3\n").await.unwrap();

        let err = merge_into(&path, Path::new("/srv/mirror")).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Invalid { .. })));
    }
}
