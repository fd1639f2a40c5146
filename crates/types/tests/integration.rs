//! Integration tests for types

#[cfg(test)]
mod tests {
    use cmirror_types::*;

    #[test]
    fn test_names_of_one_record_never_collide() {
        let id = PackageId::new("foo", "1.0.0");
        let names = [
            id.artifact_file_name(),
            id.partial_file_name(),
            id.quarantine_file_name(),
        ];

        let kinds: Vec<_> = names.iter().map(|n| CacheEntryKind::classify(n)).collect();
        assert_eq!(
            kinds,
            vec![
                CacheEntryKind::Committed,
                CacheEntryKind::Partial,
                CacheEntryKind::Quarantined
            ]
        );
    }

    #[test]
    fn test_cleanup_report_totals() {
        let mut report = CleanupReport::default();
        report.record_removal(RemovalReason::Stale);
        report.record_removal(RemovalReason::Partial);
        report.record_removal(RemovalReason::Quarantined);
        report.record_removal(RemovalReason::Quarantined);

        assert_eq!(report.total_removed(), 4);
        assert_eq!(report.quarantined_removed, 2);
    }

    #[test]
    fn test_sync_report_status() {
        let report = SyncReport {
            status: SyncStatus::Aborted,
            stats: SyncStats::default(),
            jobs: 4,
            duration_ms: 12,
        };
        assert!(!report.is_completed());
        assert_eq!(RecordOutcome::FetchFailed.to_string(), "fetch-failed");
    }
}
