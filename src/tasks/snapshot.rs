//! Periodic Snapshot Task
//!
//! Background task that persists the store at a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::persistence::{self, SnapshotBackend};
use crate::store::ShardedStore;

/// Spawns a background task that snapshots the store every `interval_secs`.
///
/// Failures are logged and the loop keeps running; persistence is best
/// effort and never blocks request handling. The first snapshot is taken one
/// full interval after start.
///
/// # Returns
/// A JoinHandle that can be aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_snapshot_task(store.clone(), backend.clone(), 60);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_snapshot_task(
    store: Arc<ShardedStore>,
    backend: Arc<dyn SnapshotBackend>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            backend = backend.name(),
            "Starting snapshot task with interval of {} seconds",
            period.as_secs()
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if let Err(e) = persistence::persist(&store, backend.as_ref()).await {
                warn!(backend = backend.name(), error = %e, "periodic snapshot failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{FileBackend, PersistenceError};
    use crate::store::{Snapshot, Value};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_snapshot_task_writes_periodically() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FileBackend::new(dir.path().join("data.json")));
        let store = Arc::new(ShardedStore::new());
        store.set("k", Value::scalar("v"), 0).unwrap();

        let handle = spawn_snapshot_task(store.clone(), backend.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let loaded = backend.load().await.unwrap();
        assert_eq!(loaded.len(), 1);

        handle.abort();
    }

    struct FailingBackend;

    #[async_trait::async_trait]
    impl SnapshotBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn save(&self, _snapshot: &Snapshot) -> Result<usize, PersistenceError> {
            Err(PersistenceError::Task("unavailable".to_string()))
        }

        async fn load(&self) -> Result<Snapshot, PersistenceError> {
            Ok(Snapshot::new())
        }
    }

    #[tokio::test]
    async fn test_snapshot_task_survives_failures() {
        let store = Arc::new(ShardedStore::new());
        let handle = spawn_snapshot_task(store, Arc::new(FailingBackend), 1);

        tokio::time::sleep(Duration::from_millis(2200)).await;
        assert!(!handle.is_finished(), "task should keep running after failures");

        handle.abort();
    }

    #[tokio::test]
    async fn test_snapshot_task_can_be_aborted() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FileBackend::new(dir.path().join("data.json")));
        let handle = spawn_snapshot_task(Arc::new(ShardedStore::new()), backend, 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
