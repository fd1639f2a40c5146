//! Cache cleanup

use crate::mirror::require_index;
use crate::OpsCtx;
use cmirror_errors::Error;
use cmirror_events::EventEmitter;
use cmirror_index::IndexReader;
use cmirror_sync::CacheReconciler;
use cmirror_types::CleanupReport;
use std::path::Path;

/// Remove stale artifacts and leftover downloads from the mirror at `dir`
///
/// The index is not refreshed first; the cache is reconciled against the
/// checkout as it is.
///
/// # Errors
///
/// Returns an error if `dir` is not a mirror or its index or cache cannot
/// be listed.
pub async fn cleanup(ctx: &OpsCtx, dir: &Path) -> Result<CleanupReport, Error> {
    ctx.emit_operation_started("cleanup");

    let index = require_index(dir).await?;
    let reader = IndexReader::new(index).with_event_sender(ctx.tx.clone());

    let report = CacheReconciler::new()
        .with_event_sender(ctx.tx.clone())
        .reconcile(dir, &reader)
        .await?;

    ctx.emit_operation_completed("cleanup", report.errors == 0);
    Ok(report)
}
