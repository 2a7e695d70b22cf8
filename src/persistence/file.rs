//! File snapshot backend.
//!
//! Writes the whole store as one JSON object: keys are store keys, values are
//! serialized entries (`{"value": {...}, "expiresAt": ...}`). Every save
//! replaces the whole file; every load parses the whole file.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::persistence::{PersistenceError, SnapshotBackend};
use crate::store::Snapshot;

/// JSON snapshot file backend.
///
/// Writes are atomic: the snapshot is written to a temporary sibling file and
/// renamed into place, so a crash mid-save never leaves a truncated snapshot.
/// Concurrent saves are serialized.
pub struct FileBackend {
    path: PathBuf,
    save_lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            save_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SnapshotBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<usize, PersistenceError> {
        let data = serde_json::to_vec(snapshot)?;
        let _guard = self.save_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!(path = %self.path.display(), entries = snapshot.len(), bytes = data.len(), "snapshot written");
        Ok(snapshot.len())
    }

    async fn load(&self) -> Result<Snapshot, PersistenceError> {
        let data = tokio::fs::read(&self.path).await?;
        let snapshot: Snapshot = serde_json::from_slice(&data)?;

        debug!(path = %self.path.display(), entries = snapshot.len(), "snapshot read");
        Ok(snapshot)
    }
}
