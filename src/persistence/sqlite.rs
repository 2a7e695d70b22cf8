//! SQLite snapshot backend.
//!
//! Rows are `(key, value, expiration)` where `value` is the JSON text of the
//! stored payload and `expiration` is a Unix timestamp in seconds (0 = never).
//! The expiration is assigned by this backend on save, not taken from the
//! store: each saved row lives for the configured entry TTL.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::persistence::{PersistenceError, SnapshotBackend};
use crate::store::{Entry, Snapshot, Value};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expiration INTEGER NOT NULL
)";

/// Relational snapshot backend over a single SQLite connection.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
    entry_ttl_secs: u64,
}

impl SqliteBackend {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    ///
    /// Saved rows expire `entry_ttl_secs` after the save; 0 means never.
    pub fn open(path: impl AsRef<Path>, entry_ttl_secs: u64) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "opened sqlite database");
        Self::with_connection(conn, entry_ttl_secs)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory(entry_ttl_secs: u64) -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory()?, entry_ttl_secs)
    }

    fn with_connection(conn: Connection, entry_ttl_secs: u64) -> Result<Self, PersistenceError> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            entry_ttl_secs,
        })
    }

    fn row_expiration(&self) -> i64 {
        if self.entry_ttl_secs == 0 {
            return 0;
        }
        let ttl = i64::try_from(self.entry_ttl_secs).unwrap_or(i64::MAX);
        Utc::now().timestamp().saturating_add(ttl)
    }
}

/// Decodes a stored value, accepting bare JSON text written by older saves.
fn decode_value(text: String) -> Value {
    serde_json::from_str::<Value>(&text)
        .or_else(|_| serde_json::from_str::<JsonValue>(&text).map(Value::Scalar))
        .unwrap_or(Value::Scalar(JsonValue::String(text)))
}

#[async_trait::async_trait]
impl SnapshotBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    /// Replaces the table contents with `snapshot` in one transaction.
    async fn save(&self, snapshot: &Snapshot) -> Result<usize, PersistenceError> {
        let rows = snapshot
            .iter()
            .map(|(key, entry)| Ok((key.clone(), serde_json::to_string(&entry.value)?)))
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        let expiration = self.row_expiration();
        let conn = Arc::clone(&self.conn);

        let saved = tokio::task::spawn_blocking(move || -> Result<usize, PersistenceError> {
            let mut conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM entries", [])?;
            {
                let mut stmt =
                    tx.prepare("INSERT INTO entries (key, value, expiration) VALUES (?1, ?2, ?3)")?;
                for (key, value) in &rows {
                    stmt.execute(params![key, value, expiration])?;
                }
            }
            tx.commit()?;
            Ok(rows.len())
        })
        .await??;

        debug!(entries = saved, expiration, "snapshot written to sqlite");
        Ok(saved)
    }

    /// Loads every row that has not passed its stored expiration.
    ///
    /// Loaded entries carry no TTL of their own.
    async fn load(&self) -> Result<Snapshot, PersistenceError> {
        let conn = Arc::clone(&self.conn);
        let now = Utc::now().timestamp();

        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<(String, String)>, PersistenceError> {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            let mut stmt = conn
                .prepare("SELECT key, value FROM entries WHERE expiration = 0 OR expiration > ?1")?;
            let mapped = stmt.query_map(params![now], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut rows = Vec::new();
            for row in mapped {
                rows.push(row?);
            }
            Ok(rows)
        })
        .await??;

        let snapshot: Snapshot = rows
            .into_iter()
            .map(|(key, text)| (key, Entry::persistent(decode_value(text))))
            .collect();

        debug!(entries = snapshot.len(), "snapshot read from sqlite");
        Ok(snapshot)
    }
}
