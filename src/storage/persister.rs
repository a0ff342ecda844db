//! Background snapshot writer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time;

use super::snapshot::{self, SnapshotError};
use crate::store::ResourceStore;

/// Sending half of the coalescing save channel.
///
/// The channel holds at most one pending request; signals posted while one
/// is pending are dropped.
#[derive(Debug, Clone)]
pub struct SaveSignal {
    tx: mpsc::Sender<()>,
}

impl SaveSignal {
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Receiving half of the save channel, drained by [`SavePersister::run`].
#[derive(Debug)]
pub struct SaveRequests {
    rx: mpsc::Receiver<()>,
}

impl SaveRequests {
    async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Takes a pending request without waiting.
    pub fn try_recv(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

pub fn save_channel() -> (SaveSignal, SaveRequests) {
    let (tx, rx) = mpsc::channel(1);
    (SaveSignal { tx }, SaveRequests { rx })
}

/// Loads the snapshot at `path` into a fresh store. Creates the snapshot directory if needed.
pub fn load_store(path: &Path) -> Result<ResourceStore, SnapshotError> {
    snapshot::ensure_parent(path)?;
    let doc = snapshot::load(path)?;
    ResourceStore::from_document(doc).map_err(|e| SnapshotError::integrity(path, e))
}

/// Writes the store to disk on save signals, on a timer, and at shutdown.
pub struct SavePersister {
    store: Arc<ResourceStore>,
    path: PathBuf,
    interval: Duration,
}

impl SavePersister {
    /// `interval` of zero disables the periodic save.
    pub fn new(store: Arc<ResourceStore>, path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            store,
            path: path.into(),
            interval,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current store contents synchronously.
    pub fn save_now(&self) -> Result<(), SnapshotError> {
        let doc = self.store.document();
        snapshot::write(&self.path, &doc)?;
        tracing::debug!(
            path = %self.path.display(),
            routers = doc.routers.len(),
            services = doc.services.len(),
            middlewares = doc.middlewares.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Runs until shutdown, then performs the final save.
    pub async fn run(
        self,
        mut requests: SaveRequests,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), SnapshotError> {
        tracing::info!(
            path = %self.path.display(),
            interval = %humantime::format_duration(self.interval),
            "Snapshot persister starting"
        );

        let mut ticker = (!self.interval.is_zero()).then(|| {
            let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                Some(()) = requests.recv() => self.save_logged(),
                _ = tick(&mut ticker) => self.save_logged(),
                _ = shutdown.recv() => {
                    tracing::info!("Snapshot persister received shutdown signal, saving");
                    break;
                }
            }
        }

        self.save_now().inspect_err(|e| {
            tracing::error!(error = %e, "Final snapshot save failed");
        })
    }

    fn save_logged(&self) {
        if let Err(e) = self.save_now() {
            tracing::error!(error = %e, "Snapshot save failed");
        }
    }
}

async fn tick(ticker: &mut Option<time::Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::model::{Middleware, Service, ServiceSpec};

    fn middleware(id: &str) -> Middleware {
        Middleware {
            id: id.into(),
            middleware_type: "stripPrefix".into(),
            config: serde_json::json!({"prefixes": ["/api"]}),
        }
    }

    #[tokio::test]
    async fn test_signal_triggers_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let (signal, requests) = save_channel();
        let store = Arc::new(ResourceStore::new().with_save_signal(signal));
        let shutdown = Shutdown::new();

        let persister = SavePersister::new(store.clone(), &path, Duration::ZERO);
        let handle = tokio::spawn(persister.run(requests, shutdown.subscribe()));

        store.create(middleware("m1")).unwrap();

        let mut saved = false;
        for _ in 0..50 {
            if load_store(&path).map(|s| s.exists::<Middleware>("m1")).unwrap_or(false) {
                saved = true;
                break;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
        assert!(saved, "snapshot never written");

        shutdown.trigger();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_performs_final_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        // No signal wired: only the shutdown save can produce the file.
        let store = Arc::new(ResourceStore::new());
        let (_signal, requests) = save_channel();
        let shutdown = Shutdown::new();

        let handle = tokio::spawn(
            SavePersister::new(store.clone(), &path, Duration::ZERO)
                .run(requests, shutdown.subscribe()),
        );
        store
            .create(Service {
                id: "s1".into(),
                spec: ServiceSpec::Url("http://b".into()),
            })
            .unwrap();
        tokio::task::yield_now().await;

        shutdown.trigger();
        handle.await.unwrap().unwrap();

        let reloaded = load_store(&path).unwrap();
        assert!(reloaded.exists::<Service>("s1"));
    }

    #[tokio::test]
    async fn test_interval_saves_without_signal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        // No signal wired: only the ticker can write before shutdown.
        let store = Arc::new(ResourceStore::new());
        let (_signal, requests) = save_channel();
        let shutdown = Shutdown::new();

        let handle = tokio::spawn(
            SavePersister::new(store.clone(), &path, Duration::from_millis(50))
                .run(requests, shutdown.subscribe()),
        );
        store.create(middleware("m1")).unwrap();

        let mut saved = false;
        for _ in 0..30 {
            time::sleep(Duration::from_millis(20)).await;
            if load_store(&path).map(|s| s.exists::<Middleware>("m1")).unwrap_or(false) {
                saved = true;
                break;
            }
        }
        assert!(saved, "periodic save never wrote the snapshot");
        assert!(!shutdown.is_triggered());

        shutdown.trigger();
        handle.await.unwrap().unwrap();
    }

    #[test]
    fn test_load_store_rejects_dangling_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"routers": {"r": {"id": "r", "rule": "Host(`a`)", "service": {"id": "ghost"}}}}"#,
        )
        .unwrap();

        assert!(matches!(
            load_store(&path),
            Err(SnapshotError::Integrity { .. })
        ));
    }
}
