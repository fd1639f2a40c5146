//! Integration tests for events

#[cfg(test)]
mod tests {
    use cmirror_events::*;
    use cmirror_types::{PackageId, SyncStats};

    #[tokio::test]
    async fn test_event_emitter() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            AppEvent::General(GeneralEvent::Error { .. })
        ));
        assert_eq!(first.meta.level, EventLevel::Error);

        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second.event,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
    }

    #[tokio::test]
    async fn test_record_events_are_correlated() {
        let (tx, mut rx) = channel();
        tx.emit_sync(SyncEvent::Corrupt {
            package: PackageId::new("foo", "1.0.0"),
            expected: "aa".into(),
            actual: "bb".into(),
            quarantined: "foo-1.0.0.crate~corrupted".into(),
            failure: FailureContext::new(
                Some("storage.checksum_mismatch"),
                "checksum mismatch",
                None::<String>,
                true,
            ),
        });

        let message = rx.recv().await.unwrap();
        assert_eq!(message.meta.correlation_id.as_deref(), Some("foo-1.0.0"));
        assert_eq!(message.meta.source, EventSource::SYNC);
        assert_eq!(message.meta.level, EventLevel::Error);
    }

    #[test]
    fn test_log_levels() {
        let up_to_date = AppEvent::Sync(SyncEvent::RecordUpToDate {
            package: PackageId::new("foo", "1.0.0"),
        });
        assert_eq!(up_to_date.log_level(), tracing::Level::DEBUG);

        let aborted = AppEvent::Sync(SyncEvent::Aborted {
            stats: SyncStats::default(),
        });
        assert_eq!(aborted.log_level(), tracing::Level::WARN);

        let rejected = AppEvent::Index(IndexEvent::RecordRejected {
            path: "3/f/foo".into(),
            line: 2,
            reason: "bad json".into(),
        });
        assert_eq!(rejected.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = AppEvent::Cleanup(CleanupEvent::Started {
            cache_dir: "/mirror".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "cleanup");
        assert_eq!(json["event"]["type"], "Started");
    }
}
