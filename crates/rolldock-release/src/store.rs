//! History store — load/save over an injected key-value backend.
//!
//! The backend is a plain put/get keyed by release name; the reference
//! deployment stores the blob as a config object in the cluster being
//! deployed to. Saves retry with exponential backoff before surfacing
//! `HistoryError::Persistence`, because a lost save after a successful
//! apply leaves cluster state and tracked state diverged.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::{HistoryError, HistoryResult};
use crate::format::{self, HistoryFormat};
use crate::history::ReleaseHistory;

/// Key-value persistence for history blobs.
#[allow(async_fn_in_trait)]
pub trait HistoryBackend {
    async fn get(&self, release_name: &str) -> anyhow::Result<Option<Vec<u8>>>;
    async fn put(&self, release_name: &str, blob: Vec<u8>) -> anyhow::Result<()>;
}

/// Save retry policy: `attempts` tries total, doubling delay between.
#[derive(Debug, Clone)]
pub struct SaveRetry {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for SaveRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Loads and persists [`ReleaseHistory`] blobs for release names.
///
/// Reads auto-detect the wire format; writes use the configured one.
/// The store provides no distributed lock — callers must serialize
/// attempts per release name.
pub struct HistoryStore<B> {
    backend: B,
    format: HistoryFormat,
    retry: SaveRetry,
}

impl<B: HistoryBackend> HistoryStore<B> {
    pub fn new(backend: B, format: HistoryFormat) -> Self {
        Self {
            backend,
            format,
            retry: SaveRetry::default(),
        }
    }

    pub fn with_retry(mut self, retry: SaveRetry) -> Self {
        self.retry = retry;
        self
    }

    /// Load the history for a release name; empty if none persisted yet.
    pub async fn load(&self, release_name: &str) -> HistoryResult<ReleaseHistory> {
        match self.backend.get(release_name).await? {
            Some(blob) => {
                let history = format::decode(&blob)?;
                debug!(
                    release = %release_name,
                    entries = history.releases().len(),
                    "release history loaded"
                );
                Ok(history)
            }
            None => {
                debug!(release = %release_name, "no release history, starting fresh");
                Ok(ReleaseHistory::new())
            }
        }
    }

    /// Persist the history, retrying with backoff on backend failure.
    pub async fn save(&self, release_name: &str, history: &ReleaseHistory) -> HistoryResult<()> {
        let blob = format::encode(history, self.format)?;

        let mut delay = self.retry.base_delay;
        let mut last_error = String::new();
        for attempt in 1..=self.retry.attempts {
            match self.backend.put(release_name, blob.clone()).await {
                Ok(()) => {
                    debug!(release = %release_name, attempt, "release history saved");
                    return Ok(());
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        release = %release_name,
                        attempt,
                        error = %last_error,
                        "release history save failed"
                    );
                    if attempt < self.retry.attempts {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(HistoryError::Persistence {
            attempts: self.retry.attempts,
            reason: last_error,
        })
    }

    /// Persist on an error path: failures are logged, never raised, so
    /// the original deployment error stays the one that propagates.
    pub async fn save_best_effort(&self, release_name: &str, history: &ReleaseHistory) {
        if let Err(e) = self.save(release_name, history).await {
            error!(release = %release_name, error = %e, "could not persist failed release");
        }
    }
}

/// In-memory backend for tests and embedded use.
#[derive(Default)]
pub struct InMemoryBackend {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    /// Number of upcoming `put` calls to fail (for retry tests).
    fail_puts: Mutex<u32>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` put calls fail.
    pub fn fail_next_puts(&self, n: u32) {
        *self.fail_puts.lock().unwrap() = n;
    }

    /// Raw blob access for assertions.
    pub fn raw(&self, release_name: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(release_name).cloned()
    }
}

impl HistoryBackend for InMemoryBackend {
    async fn get(&self, release_name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.blobs.lock().unwrap().get(release_name).cloned())
    }

    async fn put(&self, release_name: &str, blob: Vec<u8>) -> anyhow::Result<()> {
        {
            let mut fail = self.fail_puts.lock().unwrap();
            if *fail > 0 {
                *fail -= 1;
                anyhow::bail!("injected backend failure");
            }
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(release_name.to_string(), blob);
        Ok(())
    }
}

/// Backend persisting one blob file per release name under a root
/// directory. For standalone use where no cluster-side config object is
/// available.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, release_name: &str) -> PathBuf {
        self.root.join(format!("{release_name}.json"))
    }
}

impl HistoryBackend for FileBackend {
    async fn get(&self, release_name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.blob_path(release_name)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, release_name: &str, blob: Vec<u8>) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.blob_path(release_name), blob).await?;
        Ok(())
    }
}

impl<B: HistoryBackend> HistoryBackend for &B {
    async fn get(&self, release_name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        (**self).get(release_name).await
    }

    async fn put(&self, release_name: &str, blob: Vec<u8>) -> anyhow::Result<()> {
        (**self).put(release_name, blob).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::{Release, ReleaseStatus};
    use rolldock_model::{Resource, ResourceKind};

    fn history_with_one_release() -> ReleaseHistory {
        let mut release = Release::new(
            1,
            vec![Resource::new(ResourceKind::Deployment, "api", "prod")],
            true,
        );
        release.status = ReleaseStatus::Succeeded;
        ReleaseHistory::from_releases(vec![release])
    }

    #[tokio::test]
    async fn load_missing_history_is_empty() {
        let store = HistoryStore::new(InMemoryBackend::new(), HistoryFormat::Legacy);
        let history = store.load("payments").await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        for format in [HistoryFormat::Legacy, HistoryFormat::Declarative] {
            let store = HistoryStore::new(InMemoryBackend::new(), format);
            let history = history_with_one_release();

            store.save("payments", &history).await.unwrap();
            let loaded = store.load("payments").await.unwrap();

            assert_eq!(loaded.latest().unwrap().number, 1);
            assert_eq!(loaded.latest().unwrap().status, ReleaseStatus::Succeeded);
        }
    }

    #[tokio::test]
    async fn histories_are_keyed_by_release_name() {
        let backend = InMemoryBackend::new();
        let store = HistoryStore::new(&backend, HistoryFormat::Legacy);

        store.save("payments", &history_with_one_release()).await.unwrap();

        assert!(store.load("checkout").await.unwrap().is_empty());
        assert!(!store.load("payments").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn save_retries_through_transient_failures() {
        let backend = InMemoryBackend::new();
        backend.fail_next_puts(2);
        let store = HistoryStore::new(&backend, HistoryFormat::Legacy);

        store.save("payments", &history_with_one_release()).await.unwrap();
        assert!(backend.raw("payments").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn save_surfaces_persistence_error_after_budget() {
        let backend = InMemoryBackend::new();
        backend.fail_next_puts(10);
        let store = HistoryStore::new(&backend, HistoryFormat::Legacy);

        let err = store
            .save("payments", &history_with_one_release())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Persistence { attempts: 3, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn save_best_effort_swallows_errors() {
        let backend = InMemoryBackend::new();
        backend.fail_next_puts(10);
        let store = HistoryStore::new(&backend, HistoryFormat::Legacy);

        // Must not panic or propagate.
        store
            .save_best_effort("payments", &history_with_one_release())
            .await;
        assert!(backend.raw("payments").is_none());
    }

    #[tokio::test]
    async fn file_backend_roundtrips_and_misses_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(
            FileBackend::new(dir.path()),
            HistoryFormat::Legacy,
        );

        assert!(store.load("payments").await.unwrap().is_empty());

        store.save("payments", &history_with_one_release()).await.unwrap();
        let loaded = store.load("payments").await.unwrap();
        assert_eq!(loaded.latest().unwrap().number, 1);

        // One file per release name.
        assert!(dir.path().join("payments.json").exists());
        assert!(!dir.path().join("checkout.json").exists());
    }

    #[tokio::test]
    async fn legacy_blob_readable_after_switching_to_declarative() {
        let backend = InMemoryBackend::new();

        let legacy_store = HistoryStore::new(&backend, HistoryFormat::Legacy);
        legacy_store
            .save("payments", &history_with_one_release())
            .await
            .unwrap();

        // A newer orchestrator configured for declarative writes still
        // reads the old blob, and re-saves in the new format.
        let declarative_store = HistoryStore::new(&backend, HistoryFormat::Declarative);
        let history = declarative_store.load("payments").await.unwrap();
        assert_eq!(history.latest().unwrap().number, 1);

        declarative_store.save("payments", &history).await.unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&backend.raw("payments").unwrap()).unwrap();
        assert_eq!(value["schema"], "rolldock/v2");
    }
}
