//! Persistence Module
//!
//! Durability for the store: a backend receives a detached snapshot to save,
//! or produces a fresh snapshot on load. Backends never see live shard state,
//! and no shard lock is held while a backend does I/O.

mod error;
mod file;
mod sqlite;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::PersistenceMode;
use crate::store::{ShardedStore, Snapshot};

pub use error::PersistenceError;
pub use file::FileBackend;
pub use sqlite::SqliteBackend;

/// Storage for whole-store snapshots.
///
/// All implementations must be `Send + Sync` so one backend can be shared by
/// the request handlers, the periodic snapshot task and shutdown.
#[async_trait::async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Persists `snapshot`, returning the number of entries written.
    async fn save(&self, snapshot: &Snapshot) -> Result<usize, PersistenceError>;

    /// Reads the last persisted snapshot.
    async fn load(&self) -> Result<Snapshot, PersistenceError>;
}

/// Builds the backend selected by `mode`, or None when persistence is disabled.
pub fn open_backend(
    mode: &PersistenceMode,
) -> Result<Option<Arc<dyn SnapshotBackend>>, PersistenceError> {
    let backend: Arc<dyn SnapshotBackend> = match mode {
        PersistenceMode::Disabled => return Ok(None),
        PersistenceMode::File { path } => Arc::new(FileBackend::new(path)),
        PersistenceMode::Sqlite { path, entry_ttl } => {
            Arc::new(SqliteBackend::open(path, *entry_ttl)?)
        }
    };
    Ok(Some(backend))
}

/// Takes a snapshot of `store` and saves it through `backend`.
///
/// The snapshot is weakly consistent across shards (see
/// [`ShardedStore::snapshot_all`]).
pub async fn persist(
    store: &ShardedStore,
    backend: &dyn SnapshotBackend,
) -> Result<usize, PersistenceError> {
    let snapshot = store.snapshot_all();
    let saved = backend.save(&snapshot).await?;
    info!(backend = backend.name(), entries = saved, "store persisted");
    Ok(saved)
}

/// Loads the last snapshot from `backend` into `store`.
///
/// Never fails: a missing or unreadable snapshot is logged and the store is
/// left as it was. Returns the number of entries restored.
pub async fn hydrate(store: &ShardedStore, backend: &dyn SnapshotBackend) -> usize {
    match backend.load().await {
        Ok(snapshot) => {
            let restored = store.restore_all(snapshot);
            info!(backend = backend.name(), entries = restored, "store hydrated");
            restored
        }
        Err(e) if e.is_not_found() => {
            info!(backend = backend.name(), "no previous snapshot found, starting fresh");
            0
        }
        Err(e) => {
            warn!(backend = backend.name(), error = %e, "failed to load snapshot, starting empty");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct FailingBackend;

    #[async_trait::async_trait]
    impl SnapshotBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn save(&self, _snapshot: &Snapshot) -> Result<usize, PersistenceError> {
            Err(PersistenceError::Task("disk on fire".to_string()))
        }

        async fn load(&self) -> Result<Snapshot, PersistenceError> {
            Err(PersistenceError::Task("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_persist_then_hydrate_file() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("data.json"));

        let store = ShardedStore::new();
        store.set("x", Value::scalar("y"), 0).unwrap();
        store.push("list", json!("a")).unwrap();
        assert_eq!(persist(&store, &backend).await.unwrap(), 2);

        let fresh = ShardedStore::new();
        assert_eq!(hydrate(&fresh, &backend).await, 2);
        assert_eq!(fresh.get("x"), Some(Value::scalar("y")));
        assert_eq!(fresh.pop("list").unwrap(), Some(json!("a")));
    }

    #[tokio::test]
    async fn test_hydrate_missing_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("absent.json"));

        let store = ShardedStore::new();
        assert_eq!(hydrate(&store, &backend).await, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_reported_not_fatal() {
        let store = ShardedStore::new();
        store.set("k", Value::scalar(1), 0).unwrap();

        assert!(persist(&store, &FailingBackend).await.is_err());
        assert_eq!(hydrate(&store, &FailingBackend).await, 0);
        // The store is untouched by a failed load
        assert_eq!(store.get("k"), Some(Value::scalar(1)));
    }

    #[test]
    fn test_open_backend_modes() {
        assert!(open_backend(&PersistenceMode::Disabled).unwrap().is_none());

        let file = open_backend(&PersistenceMode::File {
            path: PathBuf::from("data.json"),
        })
        .unwrap()
        .unwrap();
        assert_eq!(file.name(), "file");

        let dir = TempDir::new().unwrap();
        let sqlite = open_backend(&PersistenceMode::Sqlite {
            path: dir.path().join("cache.db"),
            entry_ttl: 60,
        })
        .unwrap()
        .unwrap();
        assert_eq!(sqlite.name(), "sqlite");
    }
}
