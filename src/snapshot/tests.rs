//! Snapshot Module Tests
//!
//! ## Test Scopes
//! - **FileStore**: Missing file handling, atomic overwrite and overlapping saves.
//! - **Startup**: Restore from a snapshot vs. falling back to the backfill.
//! - **Periodic save**: Interval-driven and trigger-driven saves, failure isolation.

#[cfg(test)]
mod tests {
    use crate::error::ProviderError;
    use crate::ingestion::backfill::BackfillIngestor;
    use crate::provider::SearchProvider;
    use crate::provider::types::SearchPage;
    use crate::snapshot::manager::{SnapshotManager, StartupSource};
    use crate::snapshot::store::{FileStore, SnapshotStore};
    use crate::words::table::FrequencyTable;
    use crate::words::tokenizer::Tokenizer;
    use crate::words::types::WordValues;
    use crate::words::counting_handler;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    const TEN_MINUTES: Duration = Duration::from_secs(600);

    #[derive(Default)]
    struct MemoryStore {
        content: Mutex<Option<Vec<u8>>>,
        fail_load: bool,
        failing_saves: Mutex<usize>,
        save_attempts: AtomicUsize,
    }

    impl MemoryStore {
        fn with_content(bytes: &[u8]) -> Self {
            Self {
                content: Mutex::new(Some(bytes.to_vec())),
                ..Default::default()
            }
        }

        fn content(&self) -> Option<Vec<u8>> {
            self.content.lock().unwrap().clone()
        }

        fn attempts(&self) -> usize {
            self.save_attempts.load(Ordering::SeqCst)
        }
    }

    impl SnapshotStore for MemoryStore {
        async fn load(&self) -> anyhow::Result<Option<Vec<u8>>> {
            if self.fail_load {
                anyhow::bail!("disk unavailable");
            }
            Ok(self.content())
        }

        async fn save(&self, bytes: &[u8]) -> anyhow::Result<()> {
            self.save_attempts.fetch_add(1, Ordering::SeqCst);
            {
                let mut failing = self.failing_saves.lock().unwrap();
                if *failing > 0 {
                    *failing -= 1;
                    anyhow::bail!("disk full");
                }
            }
            *self.content.lock().unwrap() = Some(bytes.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct OnePageSearch {
        requests: AtomicUsize,
    }

    impl SearchProvider for OnePageSearch {
        async fn search_recent(
            &self,
            _query: &str,
            _cursor: Option<&str>,
        ) -> Result<SearchPage, ProviderError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(SearchPage {
                documents: vec!["backfilled observability tooling".to_string()],
                next_cursor: None,
            })
        }
    }

    fn backfill_for(
        provider: Arc<OnePageSearch>,
        table: Arc<FrequencyTable>,
    ) -> BackfillIngestor<OnePageSearch> {
        let tokenizer = Arc::new(Tokenizer::new("en", ["cloud"]));
        BackfillIngestor::new(
            provider,
            "observability",
            counting_handler(tokenizer, table),
            Duration::from_secs(2),
        )
    }

    // ============================================================
    // FILE STORE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("seed.conf"));

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_overwrites_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.conf");
        let store = FileStore::new(&path);

        store.save(b"first").await.unwrap();
        store.save(b"second").await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(b"second".to_vec()));
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "staging files must not be left behind");
        assert_eq!(store.path(), path.as_path());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_store_overlapping_saves_both_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path().join("seed.conf")));
        let first = vec![b'a'; 256 * 1024];
        let second = vec![b'b'; 256 * 1024];

        for _ in 0..20 {
            let (left, right) = tokio::join!(
                tokio::spawn({
                    let store = store.clone();
                    let bytes = first.clone();
                    async move { store.save(&bytes).await }
                }),
                tokio::spawn({
                    let store = store.clone();
                    let bytes = second.clone();
                    async move { store.save(&bytes).await }
                }),
            );
            left.unwrap().unwrap();
            right.unwrap().unwrap();

            let on_disk = store.load().await.unwrap().unwrap();
            assert!(on_disk == first || on_disk == second, "file mixes two saves");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_save_now_calls_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.conf");
        let table = FrequencyTable::new();
        table.increment_all((0..20_000).map(|i| format!("word{}", i)));
        let manager = Arc::new(SnapshotManager::new(FileStore::new(&path), table, TEN_MINUTES));

        for _ in 0..20 {
            let (left, right) = tokio::join!(
                tokio::spawn({
                    let manager = manager.clone();
                    async move { manager.save_now().await }
                }),
                tokio::spawn({
                    let manager = manager.clone();
                    async move { manager.save_now().await }
                }),
            );
            assert_eq!(left.unwrap().unwrap(), 20_000);
            assert_eq!(right.unwrap().unwrap(), 20_000);
        }

        let saved: WordValues = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(saved.len(), 20_000);
    }

    #[tokio::test]
    async fn test_file_store_unreadable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory can't be read as a file
        let store = FileStore::new(dir.path());

        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn test_snapshot_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.conf");

        let table = FrequencyTable::new();
        table.increment_all(["rust", "rust", "tokio"]);
        let saver = SnapshotManager::new(FileStore::new(&path), table.clone(), TEN_MINUTES);
        assert_eq!(saver.save_now().await.unwrap(), 2);

        let on_disk: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, serde_json::json!({"wordvalues": {"rust": 2, "tokio": 1}}));

        let restored = FrequencyTable::new();
        let loader = SnapshotManager::new(FileStore::new(&path), restored.clone(), TEN_MINUTES);
        assert_eq!(loader.restore().await, Some(2));
        assert_eq!(restored.snapshot(), table.snapshot());
    }

    // ============================================================
    // STARTUP TESTS
    // ============================================================

    #[tokio::test]
    async fn test_startup_prefers_snapshot() {
        let store = MemoryStore::with_content(br#"{"wordvalues": {"ansible": 4, "packer": 1}}"#);
        let table = FrequencyTable::new();
        let manager = SnapshotManager::new(store, table.clone(), TEN_MINUTES);
        let provider = Arc::new(OnePageSearch::default());

        let source = manager
            .restore_or_backfill(&backfill_for(provider.clone(), table.clone()))
            .await;

        assert_eq!(source, StartupSource::Snapshot { words: 2 });
        assert_eq!(provider.requests.load(Ordering::SeqCst), 0);
        assert_eq!(table.count("ansible"), 4);
    }

    #[tokio::test]
    async fn test_startup_without_snapshot_backfills() {
        let table = FrequencyTable::new();
        let manager = SnapshotManager::new(MemoryStore::default(), table.clone(), TEN_MINUTES);
        let provider = Arc::new(OnePageSearch::default());

        let source = manager
            .restore_or_backfill(&backfill_for(provider.clone(), table.clone()))
            .await;

        match source {
            StartupSource::Backfill(report) => {
                assert!(report.completed);
                assert_eq!(report.pages, 1);
            }
            other => panic!("expected backfill, got {:?}", other),
        }
        assert_eq!(provider.requests.load(Ordering::SeqCst), 1);
        assert_eq!(table.count("observability"), 1);
    }

    #[tokio::test]
    async fn test_startup_with_corrupt_snapshot_backfills() {
        let table = FrequencyTable::new();
        let manager =
            SnapshotManager::new(MemoryStore::with_content(b"{not json"), table.clone(), TEN_MINUTES);
        let provider = Arc::new(OnePageSearch::default());

        let source = manager
            .restore_or_backfill(&backfill_for(provider.clone(), table.clone()))
            .await;

        assert!(matches!(source, StartupSource::Backfill(_)));
        assert_eq!(table.count("tooling"), 1);
    }

    #[tokio::test]
    async fn test_startup_with_unreadable_snapshot_backfills() {
        let store = MemoryStore {
            fail_load: true,
            ..Default::default()
        };
        let table = FrequencyTable::new();
        let manager = SnapshotManager::new(store, table.clone(), TEN_MINUTES);
        let provider = Arc::new(OnePageSearch::default());

        let source = manager
            .restore_or_backfill(&backfill_for(provider.clone(), table))
            .await;

        assert!(matches!(source, StartupSource::Backfill(_)));
        assert_eq!(provider.requests.load(Ordering::SeqCst), 1);
    }

    // ============================================================
    // PERIODIC SAVE TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_run_saves_every_interval() {
        let table = FrequencyTable::new();
        table.increment("consul");
        let manager = Arc::new(SnapshotManager::new(
            MemoryStore::default(),
            table.clone(),
            TEN_MINUTES,
        ));

        let runner = manager.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(manager.store().attempts(), 0, "no save before the first interval");

        tokio::time::sleep(Duration::from_secs(1220)).await;
        assert_eq!(manager.store().attempts(), 2);

        let saved: WordValues =
            serde_json::from_slice(&manager.store().content().unwrap()).unwrap();
        assert_eq!(saved.words.get("consul"), Some(&1));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_continues_after_failed_save() {
        let store = MemoryStore {
            failing_saves: Mutex::new(1),
            ..Default::default()
        };
        let table = FrequencyTable::new();
        table.increment("nomad");
        let manager = Arc::new(SnapshotManager::new(store, table, TEN_MINUTES));

        let runner = manager.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        tokio::time::sleep(Duration::from_secs(610)).await;
        assert_eq!(manager.store().attempts(), 1);
        assert!(manager.store().content().is_none());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(manager.store().attempts(), 2);
        assert!(manager.store().content().is_some());
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test]
    async fn test_run_with_trigger_saves_per_message() {
        let table = FrequencyTable::new();
        let manager = SnapshotManager::new(MemoryStore::default(), table.clone(), TEN_MINUTES);
        let (tx, rx) = mpsc::channel(4);

        table.increment("vault");
        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();
        drop(tx);

        manager.run_with_trigger(rx).await;

        assert_eq!(manager.store().attempts(), 2);
        let saved: WordValues =
            serde_json::from_slice(&manager.store().content().unwrap()).unwrap();
        assert_eq!(saved.words.get("vault"), Some(&1));
    }

    #[tokio::test]
    async fn test_save_now_reports_failure() {
        let store = MemoryStore {
            failing_saves: Mutex::new(1),
            ..Default::default()
        };
        let manager = SnapshotManager::new(store, FrequencyTable::new(), TEN_MINUTES);

        assert!(manager.save_now().await.is_err());
        assert_eq!(manager.save_now().await.unwrap(), 0);
    }
}
