//! Event handling and user feedback
//!
//! Every event goes to `tracing`; the interesting ones also get a short
//! status line on stderr so a long update shows what it is doing.

use crate::logging::log_event_with_tracing;
use cmirror_events::{AppEvent, CleanupEvent, EventMessage, GeneralEvent, IndexEvent, SyncEvent};
use console::{Style, Term};

/// Event handler for user feedback
pub struct EventHandler {
    term: Term,
    colors: bool,
    /// Suppress status lines (JSON output owns stdout and stderr stays quiet)
    quiet: bool,
}

impl EventHandler {
    pub fn new(colors: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);

        if self.quiet {
            return;
        }

        if let Some((kind, line)) = status_line(&message.event) {
            self.show(kind, &line);
        }
    }

    fn show(&self, kind: StatusKind, line: &str) {
        let rendered = if self.colors {
            let style = match kind {
                StatusKind::Progress => Style::new().dim(),
                StatusKind::Success => Style::new().green(),
                StatusKind::Warning => Style::new().yellow(),
                StatusKind::Failure => Style::new().red().bold(),
            };
            style.apply_to(line).to_string()
        } else {
            line.to_string()
        };
        let _ = self.term.write_line(&rendered);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Progress,
    Success,
    Warning,
    Failure,
}

/// Short human-readable line for an event, if it deserves one
fn status_line(event: &AppEvent) -> Option<(StatusKind, String)> {
    let line = match event {
        AppEvent::General(GeneralEvent::Warning { message, context }) => match context {
            Some(context) => (StatusKind::Warning, format!("warning: {message} ({context})")),
            None => (StatusKind::Warning, format!("warning: {message}")),
        },
        AppEvent::General(GeneralEvent::Error { message, .. }) => {
            (StatusKind::Failure, format!("error: {message}"))
        }

        AppEvent::Index(IndexEvent::CloneStarted { url, path }) => (
            StatusKind::Progress,
            format!("cloning {url} into {}", path.display()),
        ),
        AppEvent::Index(IndexEvent::RefreshStarted { .. }) => {
            (StatusKind::Progress, "refreshing index".to_string())
        }
        AppEvent::Index(IndexEvent::RefreshFailed { failure, .. }) => (
            StatusKind::Failure,
            format!("index refresh failed: {}", failure.message),
        ),
        AppEvent::Index(IndexEvent::RecordRejected { path, line, reason }) => (
            StatusKind::Warning,
            format!("skipping {}:{line}: {reason}", path.display()),
        ),

        AppEvent::Sync(SyncEvent::Started { jobs, .. }) => (
            StatusKind::Progress,
            format!("synchronizing with {jobs} job(s)"),
        ),
        AppEvent::Sync(SyncEvent::Downloaded { package, .. }) => {
            (StatusKind::Success, format!("downloaded {package}"))
        }
        AppEvent::Sync(SyncEvent::StaleArtifactReplaced { package, .. }) => (
            StatusKind::Warning,
            format!("{package}: cached file is corrupt, fetching again"),
        ),
        AppEvent::Sync(SyncEvent::FetchFailed { package, failure, .. }) => (
            StatusKind::Failure,
            format!("{package}: {}", failure.message),
        ),
        AppEvent::Sync(SyncEvent::Corrupt {
            package,
            expected,
            actual,
            ..
        }) => (
            StatusKind::Failure,
            format!("{package}: checksum mismatch (expected {expected}, got {actual})"),
        ),
        AppEvent::Sync(SyncEvent::RecordFailed { package, failure }) => (
            StatusKind::Failure,
            format!("{package}: {}", failure.message),
        ),
        AppEvent::Sync(SyncEvent::Aborted { .. }) => {
            (StatusKind::Warning, "update aborted by user".to_string())
        }

        AppEvent::Cleanup(CleanupEvent::EntryRemoved { path, reason }) => (
            StatusKind::Progress,
            format!("removed {reason} {}", path.display()),
        ),
        AppEvent::Cleanup(CleanupEvent::RemovalFailed { path, error, .. }) => (
            StatusKind::Failure,
            format!("cannot remove {}: {error}", path.display()),
        ),

        _ => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmirror_events::FailureContext;
    use cmirror_types::PackageId;

    #[test]
    fn test_quiet_events_have_no_status_line() {
        let event = AppEvent::Sync(SyncEvent::RecordUpToDate {
            package: PackageId::new("foo", "1.0.0"),
        });
        assert!(status_line(&event).is_none());
    }

    #[test]
    fn test_fetch_failure_line() {
        let event = AppEvent::Sync(SyncEvent::FetchFailed {
            package: PackageId::new("foo", "1.0.0"),
            url: "http://example.com".to_string(),
            failure: FailureContext::new(None::<String>, "HTTP 404", None::<String>, false),
        });
        let (kind, line) = status_line(&event).unwrap();
        assert_eq!(kind, StatusKind::Failure);
        assert_eq!(line, "foo-1.0.0: HTTP 404");
    }

    #[test]
    fn test_handler_accepts_every_domain() {
        let mut handler = EventHandler::new(false, true);
        handler.handle_event(EventMessage::from_event(AppEvent::Cleanup(
            CleanupEvent::Started {
                cache_dir: "/tmp".into(),
            },
        )));
        handler.handle_event(EventMessage::from_event(AppEvent::General(
            GeneralEvent::warning("careful"),
        )));
    }
}
