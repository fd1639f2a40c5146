//! Integration tests for ops crate

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use cmirror_errors::{Error, OpsError};
    use cmirror_events::{AppEvent, EventReceiver, IndexEvent};
    use cmirror_hash::Hash;
    use cmirror_index::IndexRefresher;
    use cmirror_ops::*;
    use cmirror_types::SyncStatus;
    use httpmock::prelude::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::fs;

    const PAYLOAD: &[u8] = b"foo-1.0.0 payload";

    /// Stands in for git: "cloning" writes a one-package index
    struct FakeIndex {
        dl: String,
        refreshes: AtomicUsize,
    }

    impl FakeIndex {
        fn new(dl: impl Into<String>) -> Arc<Self> {
            Arc::new(Self {
                dl: dl.into(),
                refreshes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IndexRefresher for FakeIndex {
        async fn clone_index(&self, _url: &str, dest: &Path) -> Result<(), Error> {
            fs::create_dir_all(dest.join("3/f")).await?;
            fs::write(dest.join("config.json"), format!(r#"{{"dl":"{}"}}"#, self.dl)).await?;
            fs::write(
                dest.join("3/f/foo"),
                format!(
                    r#"{{"name":"foo","vers":"1.0.0","cksum":"{}","yanked":true}}"#,
                    Hash::from_data(PAYLOAD).to_hex()
                ) + "\n",
            )
            .await?;
            Ok(())
        }

        async fn refresh(&self, _index_dir: &Path) -> Result<(), Error> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn context(refresher: Arc<FakeIndex>) -> (OpsCtx, EventReceiver) {
        let (tx, rx) = cmirror_events::channel();
        let ctx = OpsContextBuilder::new()
            .with_refresher(refresher)
            .with_event_sender(tx)
            .build()
            .unwrap();
        (ctx, rx)
    }

    fn events(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(message) = rx.try_recv() {
            events.push(message.event);
        }
        events
    }

    #[tokio::test]
    async fn test_new_mirror_clones_index() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("mirror");
        let (ctx, mut rx) = context(FakeIndex::new("http://unused"));

        let info = new_mirror(&ctx, &dir).await.unwrap();
        assert_eq!(info.index, dir.join("index"));
        assert!(dir.join("index/3/f/foo").is_file());
        assert!(events(&mut rx)
            .iter()
            .any(|event| matches!(event, AppEvent::Index(IndexEvent::CloneCompleted { .. }))));

        let err = new_mirror(&ctx, &dir).await.unwrap_err();
        assert!(matches!(err, Error::Ops(OpsError::MirrorCreationFailed { .. })));
    }

    #[tokio::test]
    async fn test_init_mirror_preconditions() {
        let temp = tempdir().unwrap();
        let (ctx, _rx) = context(FakeIndex::new("http://unused"));

        let missing = init_mirror(&ctx, &temp.path().join("absent")).await.unwrap_err();
        assert!(matches!(missing, Error::Ops(OpsError::MirrorInitFailed { .. })));

        let file = temp.path().join("plain-file");
        fs::write(&file, b"").await.unwrap();
        let not_dir = init_mirror(&ctx, &file).await.unwrap_err();
        assert!(matches!(not_dir, Error::Ops(OpsError::MirrorInitFailed { .. })));

        init_mirror(&ctx, temp.path()).await.unwrap();
        assert!(temp.path().join("index/config.json").is_file());

        let again = init_mirror(&ctx, temp.path()).await.unwrap_err();
        assert!(matches!(again, Error::Ops(OpsError::MirrorInitFailed { .. })));
    }

    #[tokio::test]
    async fn test_update_requires_an_index() {
        let temp = tempdir().unwrap();
        let refresher = FakeIndex::new("http://unused");
        let (ctx, _rx) = context(refresher.clone());

        let err = update(&ctx, temp.path(), &UpdateOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Ops(OpsError::InvalidMirror { .. })));
        assert_eq!(refresher.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_uses_published_download_template() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/dl/foo/1.0.0.crate");
                then.status(200).body(PAYLOAD);
            })
            .await;

        let temp = tempdir().unwrap();
        let refresher = FakeIndex::new(format!("{}/dl/{{crate}}/{{version}}.crate", server.base_url()));
        let (ctx, mut rx) = context(refresher.clone());
        init_mirror(&ctx, temp.path()).await.unwrap();

        let options = UpdateOptions {
            jobs: Some(2),
            offline: false,
        };
        let report = update(&ctx, temp.path(), &options).await.unwrap();

        mock.assert_async().await;
        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(report.stats.downloaded, 1);
        assert_eq!(report.jobs, 2);
        assert_eq!(refresher.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(
            Hash::hash_file(&temp.path().join("foo-1.0.0.crate")).await.unwrap(),
            Hash::from_data(PAYLOAD)
        );
        assert!(events(&mut rx)
            .iter()
            .any(|event| matches!(event, AppEvent::Index(IndexEvent::RefreshCompleted { .. }))));
    }

    #[tokio::test]
    async fn test_offline_update_skips_refresh() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/foo/1.0.0/download");
                then.status(200).body(PAYLOAD);
            })
            .await;

        let temp = tempdir().unwrap();
        let refresher = FakeIndex::new(server.base_url());
        let (ctx, mut rx) = context(refresher.clone());
        init_mirror(&ctx, temp.path()).await.unwrap();

        let options = UpdateOptions {
            jobs: Some(1),
            offline: true,
        };
        let report = update(&ctx, temp.path(), &options).await.unwrap();

        assert_eq!(report.stats.downloaded, 1);
        assert_eq!(refresher.refreshes.load(Ordering::SeqCst), 0);
        assert!(events(&mut rx)
            .iter()
            .any(|event| matches!(event, AppEvent::Index(IndexEvent::RefreshSkipped { .. }))));

        let second = update(&ctx, temp.path(), &options).await.unwrap();
        assert_eq!(second.stats.up_to_date, 1);
    }

    #[tokio::test]
    async fn test_cleanup_reconciles_mirror() {
        let temp = tempdir().unwrap();
        let (ctx, _rx) = context(FakeIndex::new("http://unused"));
        init_mirror(&ctx, temp.path()).await.unwrap();

        fs::write(temp.path().join("foo-1.0.0.crate"), PAYLOAD).await.unwrap();
        fs::write(temp.path().join("gone-0.1.0.crate"), b"old").await.unwrap();
        fs::write(temp.path().join("foo-1.0.0.crate~"), b"half").await.unwrap();

        let report = cleanup(&ctx, temp.path()).await.unwrap();
        assert_eq!(report.stale_removed, 1);
        assert_eq!(report.partial_removed, 1);
        assert_eq!(report.kept, 1);
        assert!(OperationResult::CleanupReport(report).is_success());
        assert!(temp.path().join("index/config.json").is_file());
    }

    #[tokio::test]
    async fn test_install_print_writes_nothing() {
        let temp = tempdir().unwrap();
        let (ctx, _rx) = context(FakeIndex::new("http://unused"));

        let report = install(&ctx, temp.path(), &InstallTarget::Print).await.unwrap();

        assert!(report.config_file.is_none());
        assert!(report.snippet.contains("replace-with"));
        assert!(report.snippet.contains(&temp.path().display().to_string()));
    }

    #[tokio::test]
    async fn test_install_into_config_file() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("nested/.cargo/config.toml");
        let (ctx, _rx) = context(FakeIndex::new("http://unused"));

        let report = install(&ctx, temp.path(), &InstallTarget::File(config.clone()))
            .await
            .unwrap();

        assert_eq!(report.config_file.as_deref(), Some(config.as_path()));
        let written: toml::Table = fs::read_to_string(&config).await.unwrap().parse().unwrap();
        assert_eq!(
            written["source"]["local-mirror"]["local-registry"].as_str(),
            Some(temp.path().display().to_string().as_str())
        );
    }
}
