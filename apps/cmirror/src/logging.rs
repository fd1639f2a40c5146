//! Structured logging integration for events
//!
//! Forwards every [`EventMessage`] to `tracing` at the event's level, with
//! the event's payload as structured fields.

use cmirror_events::{AppEvent, CleanupEvent, EventMessage, GeneralEvent, IndexEvent, SyncEvent};
use tracing::{debug, error, info, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    match &message.event {
        AppEvent::General(event) => log_general(message, event),
        AppEvent::Index(event) => log_index(message, event),
        AppEvent::Sync(event) => log_sync(message, event),
        AppEvent::Cleanup(event) => log_cleanup(message, event),
    }
}

fn log_general(message: &EventMessage, event: &GeneralEvent) {
    let meta = &message.meta;
    match event {
        GeneralEvent::Warning { message, context } => {
            warn!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                context = ?context,
                "{message}"
            );
        }
        GeneralEvent::Error { message, details } => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                details = ?details,
                "{message}"
            );
        }
        GeneralEvent::DebugLog { message, context } => {
            debug!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                context = ?context,
                "{message}"
            );
        }
        GeneralEvent::OperationStarted { operation } => {
            info!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                operation = %operation,
                "Operation started"
            );
        }
        GeneralEvent::OperationCompleted { operation, success } => {
            info!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                operation = %operation,
                success = success,
                "Operation completed"
            );
        }
        GeneralEvent::OperationFailed { operation, failure } => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                operation = %operation,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Operation failed"
            );
        }
    }
}

fn log_index(message: &EventMessage, event: &IndexEvent) {
    let meta = &message.meta;
    match event {
        IndexEvent::RefreshStarted { path } => {
            info!(source = meta.source.as_str(), path = %path.display(), "Index refresh started");
        }
        IndexEvent::RefreshCompleted { path } => {
            info!(source = meta.source.as_str(), path = %path.display(), "Index refreshed");
        }
        IndexEvent::RefreshSkipped { path } => {
            info!(source = meta.source.as_str(), path = %path.display(), "Index refresh skipped");
        }
        IndexEvent::RefreshFailed { path, failure } => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                path = %path.display(),
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Index refresh failed"
            );
        }
        IndexEvent::CloneStarted { url, path } => {
            info!(
                source = meta.source.as_str(),
                url = %url,
                path = %path.display(),
                "Cloning index"
            );
        }
        IndexEvent::CloneCompleted { path } => {
            info!(source = meta.source.as_str(), path = %path.display(), "Index cloned");
        }
        IndexEvent::ScanStarted { root } => {
            info!(source = meta.source.as_str(), root = %root.display(), "Index scan started");
        }
        IndexEvent::ScanCompleted {
            root,
            records,
            rejected,
        } => {
            info!(
                source = meta.source.as_str(),
                root = %root.display(),
                records = records,
                rejected = rejected,
                "Index scan completed"
            );
        }
        IndexEvent::RecordRejected { path, line, reason } => {
            warn!(
                source = meta.source.as_str(),
                path = %path.display(),
                line = line,
                reason = %reason,
                "Skipping malformed index record"
            );
        }
        IndexEvent::EntryUnreadable { path, reason } => {
            warn!(
                source = meta.source.as_str(),
                path = %path.display(),
                reason = %reason,
                "Skipping unreadable index entry"
            );
        }
    }
}

fn log_sync(message: &EventMessage, event: &SyncEvent) {
    let meta = &message.meta;
    match event {
        SyncEvent::Started { cache_dir, jobs } => {
            info!(
                source = meta.source.as_str(),
                cache_dir = %cache_dir.display(),
                jobs = jobs,
                "Synchronization started"
            );
        }
        SyncEvent::RecordUpToDate { package } => {
            debug!(source = meta.source.as_str(), package = %package, "Up to date");
        }
        SyncEvent::StaleArtifactReplaced {
            package,
            expected,
            actual,
            failure,
        } => {
            warn!(
                source = meta.source.as_str(),
                package = %package,
                expected = %expected,
                actual = %actual,
                code = ?failure.code,
                "Cached artifact does not match its checksum, fetching again"
            );
        }
        SyncEvent::FetchStarted { package, url } => {
            debug!(source = meta.source.as_str(), package = %package, url = %url, "Fetching");
        }
        SyncEvent::Downloaded { package, bytes } => {
            info!(
                source = meta.source.as_str(),
                package = %package,
                bytes = bytes,
                "Downloaded"
            );
        }
        SyncEvent::FetchFailed {
            package,
            url,
            failure,
        } => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                package = %package,
                url = %url,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                "Fetch failed"
            );
        }
        SyncEvent::Corrupt {
            package,
            expected,
            actual,
            quarantined,
            failure,
        } => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                package = %package,
                expected = %expected,
                actual = %actual,
                quarantined = %quarantined.display(),
                code = ?failure.code,
                hint = ?failure.hint,
                "Checksum mismatch, download quarantined"
            );
        }
        SyncEvent::RecordFailed { package, failure } => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                package = %package,
                code = ?failure.code,
                message = %failure.message,
                "Record failed"
            );
        }
        SyncEvent::Aborted { stats } => {
            warn!(
                source = meta.source.as_str(),
                up_to_date = stats.up_to_date,
                downloaded = stats.downloaded,
                failed = stats.failed,
                corrupt = stats.corrupt,
                aborted = stats.aborted,
                "Synchronization aborted"
            );
        }
        SyncEvent::Completed { stats, duration_ms } => {
            info!(
                source = meta.source.as_str(),
                up_to_date = stats.up_to_date,
                downloaded = stats.downloaded,
                failed = stats.failed,
                corrupt = stats.corrupt,
                duration_ms = duration_ms,
                "Synchronization completed"
            );
        }
    }
}

fn log_cleanup(message: &EventMessage, event: &CleanupEvent) {
    let meta = &message.meta;
    match event {
        CleanupEvent::Started { cache_dir } => {
            info!(source = meta.source.as_str(), cache_dir = %cache_dir.display(), "Cleanup started");
        }
        CleanupEvent::EntryRemoved { path, reason } => {
            info!(
                source = meta.source.as_str(),
                path = %path.display(),
                reason = %reason,
                "Removed"
            );
        }
        CleanupEvent::RemovalFailed {
            path,
            reason,
            error,
        } => {
            warn!(
                source = meta.source.as_str(),
                path = %path.display(),
                reason = %reason,
                error = %error,
                "Could not remove"
            );
        }
        CleanupEvent::Completed { report } => {
            info!(
                source = meta.source.as_str(),
                stale = report.stale_removed,
                partial = report.partial_removed,
                quarantined = report.quarantined_removed,
                kept = report.kept,
                stale_skipped = report.stale_skipped,
                errors = report.errors,
                "Cleanup completed"
            );
        }
    }
}
