//! Error types for snapshot persistence.

/// Errors that can occur while saving or loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Reading or writing the snapshot file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot or a stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The database rejected a statement or could not be opened.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A blocking persistence task panicked or was cancelled.
    #[error("persistence task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for PersistenceError {
    fn from(err: tokio::task::JoinError) -> Self {
        PersistenceError::Task(err.to_string())
    }
}

impl PersistenceError {
    /// Returns true if the failure means "nothing was saved yet".
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistenceError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
