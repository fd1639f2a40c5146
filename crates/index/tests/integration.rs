//! Integration tests for index crate

#[cfg(test)]
mod tests {
    use cmirror_events::{AppEvent, IndexEvent};
    use cmirror_hash::Hash;
    use cmirror_index::*;
    use std::path::Path;
    use tempfile::tempdir;
    use tokio::fs;

    fn line(name: &str, vers: &str) -> String {
        format!(
            r#"{{"name":"{name}","vers":"{vers}","deps":[],"cksum":"{}","features":{{}},"yanked":false}}"#,
            Hash::from_data(format!("{name}-{vers}").as_bytes()).to_hex()
        )
    }

    async fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, contents).await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped_and_reported() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "config.json", r#"{"dl":"https://example.com"}"#).await;
        write(
            root,
            "3/f/foo",
            &format!("{}\nthis is not json\n{}\n", line("foo", "1.0.0"), line("foo", "1.1.0")),
        )
        .await;

        let (tx, mut rx) = cmirror_events::channel();
        let reader = IndexReader::new(root).with_event_sender(tx);

        let mut stream = reader.records().await.unwrap();
        let mut ids = Vec::new();
        while let Some(record) = stream.next().await {
            ids.push(record.id().to_string());
        }
        let summary = stream.finish().await.unwrap();

        assert_eq!(ids, vec!["foo-1.0.0", "foo-1.1.0"]);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.rejected, 1);

        let mut rejected = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Index(IndexEvent::RecordRejected { line, .. }) = message.event {
                rejected.push(line);
            }
        }
        assert_eq!(rejected, vec![2]);
    }

    #[tokio::test]
    async fn test_nested_directories_and_hidden_entries() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "1/a", &line("a", "0.1.0")).await;
        write(root, "se/rd/serde", &line("serde", "1.0.0")).await;
        write(root, ".git/config", "[core]").await;
        write(root, "se/rd/.serde.swp", "garbage").await;

        let (records, summary) = IndexReader::new(root).collect().await.unwrap();
        assert!(summary.is_complete());
        let ids: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["a-0.1.0", "serde-1.0.0"]);
    }

    #[tokio::test]
    async fn test_root_that_is_a_file_is_unreadable() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("index");
        fs::write(&file, "").await.unwrap();

        let err = IndexReader::new(&file).collect().await.unwrap_err();
        assert!(matches!(
            err,
            cmirror_errors::Error::Index(cmirror_errors::IndexError::RootUnreadable { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropping_stream_stops_walk() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let contents: Vec<String> = (0..1000).map(|i| line("big", &format!("0.0.{i}"))).collect();
        write(root, "3/b/big", &contents.join("\n")).await;

        let mut stream = IndexReader::new(root).records().await.unwrap();
        assert!(stream.next().await.is_some());
        let summary = stream.finish().await.unwrap();
        assert!(summary.records < 1000);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_rest_of_file() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut contents = line("foo", "1.0.0").into_bytes();
        contents.extend_from_slice(b"\n\xff\xfe not a record\n");
        contents.extend_from_slice(line("foo", "1.1.0").as_bytes());
        contents.push(b'\n');
        fs::create_dir_all(root.join("3/f")).await.unwrap();
        fs::write(root.join("3/f/foo"), contents).await.unwrap();

        let (tx, mut rx) = cmirror_events::channel();
        let (records, summary) = IndexReader::new(root)
            .with_event_sender(tx)
            .collect()
            .await
            .unwrap();

        let ids: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["foo-1.0.0", "foo-1.1.0"]);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.unreadable, 0);

        let mut unreadable = 0;
        let mut rejected = Vec::new();
        while let Ok(message) = rx.try_recv() {
            match message.event {
                AppEvent::Index(IndexEvent::RecordRejected { line, .. }) => rejected.push(line),
                AppEvent::Index(IndexEvent::EntryUnreadable { .. }) => unreadable += 1,
                _ => {}
            }
        }
        assert_eq!(rejected, vec![2]);
        assert_eq!(unreadable, 0);
    }
}
