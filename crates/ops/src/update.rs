//! Update command implementation
//!
//! Refreshes the index and runs one synchronization pass over the mirror.

use crate::mirror::require_index;
use crate::{OpsCtx, UpdateOptions};
use cmirror_errors::Error;
use cmirror_events::{EventEmitter, IndexEvent};
use cmirror_index::IndexReader;
use cmirror_net::{ArtifactFetcher, DownloadTemplate};
use cmirror_sync::{RecordProcessor, SyncCoordinator};
use cmirror_types::SyncReport;
use std::path::Path;

/// Bring the mirror at `dir` up to date with its index
///
/// # Errors
///
/// Returns an error if `dir` is not a mirror, the download template is
/// invalid, the index refresh fails, or the index cannot be scanned.
/// Individual record failures only show up in the report.
pub async fn update(ctx: &OpsCtx, dir: &Path, options: &UpdateOptions) -> Result<SyncReport, Error> {
    ctx.emit_operation_started("update");

    let index = require_index(dir).await?;
    let reader = IndexReader::new(&index).with_event_sender(ctx.tx.clone());

    // The registry description rarely changes, so the published template
    // is taken from the checkout as it is before the refresh
    let published = reader.registry_config().await?.and_then(|config| config.dl);
    let template = DownloadTemplate::resolve(
        ctx.config.registry.download_url.as_deref(),
        published.as_deref(),
    )?;
    ctx.emit_debug(format!("download template: {}", template.as_str()));

    let jobs = match options.jobs {
        Some(jobs) if jobs > 0 => jobs,
        _ => ctx.config.jobs(),
    };

    let processor = RecordProcessor::new(dir, ArtifactFetcher::new(ctx.net.clone()), template)
        .with_event_sender(ctx.tx.clone());

    let mut coordinator = SyncCoordinator::new(reader, processor, jobs)
        .with_cancellation(ctx.cancel.clone())
        .with_event_sender(ctx.tx.clone());

    if options.offline {
        ctx.emit_index(IndexEvent::RefreshSkipped { path: index });
    } else {
        coordinator = coordinator.with_refresher(ctx.refresher.clone());
    }

    match coordinator.run().await {
        Ok(report) => {
            ctx.emit_operation_completed("update", report.is_completed());
            Ok(report)
        }
        Err(e) => {
            ctx.emit_operation_failed("update", &e);
            Err(e)
        }
    }
}
