//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.
//! The resulting [`Config`] is built once in `main` and passed down explicitly.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::store::SHARD_COUNT;

/// Where, if anywhere, store snapshots are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Nothing is loaded at startup or saved at shutdown
    Disabled,
    /// JSON snapshot file
    File { path: PathBuf },
    /// SQLite database; saved rows expire `entry_ttl` seconds after each save
    Sqlite { path: PathBuf, entry_ttl: u64 },
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Number of store shards
    pub shard_count: usize,
    /// Enables file snapshots when no database is configured
    pub enable_persistence: bool,
    /// Snapshot file location
    pub snapshot_path: PathBuf,
    /// Seconds between periodic snapshots, 0 = only on shutdown or request
    pub snapshot_interval: u64,
    /// Database type (`sqlite`); takes precedence over file snapshots
    pub db_type: Option<String>,
    /// Database location
    pub db_dsn: String,
    /// Lifetime in seconds of rows written to the database
    pub db_entry_ttl: u64,
    /// Bearer token required by the API, None = authentication disabled
    pub auth_token: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `SHARD_COUNT` - Number of store shards (default: 16)
    /// - `ENABLE_PERSISTENCE` - `true` enables file snapshots (default: false)
    /// - `SNAPSHOT_PATH` - Snapshot file path (default: data.json)
    /// - `SNAPSHOT_INTERVAL` - Periodic snapshot seconds, 0 disables (default: 0)
    /// - `DB_TYPE` - Database type, only `sqlite` is supported (default: unset)
    /// - `DB_DSN` - Database path (default: cache.db)
    /// - `DB_ENTRY_TTL` - Database row lifetime in seconds (default: 86400)
    /// - `AUTH_TOKEN` - Required bearer token (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            shard_count: parse_var("SHARD_COUNT")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.shard_count),
            enable_persistence: env::var("ENABLE_PERSISTENCE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.enable_persistence),
            snapshot_path: non_empty_var("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            snapshot_interval: parse_var("SNAPSHOT_INTERVAL").unwrap_or(defaults.snapshot_interval),
            db_type: non_empty_var("DB_TYPE"),
            db_dsn: non_empty_var("DB_DSN").unwrap_or(defaults.db_dsn),
            db_entry_ttl: parse_var("DB_ENTRY_TTL").unwrap_or(defaults.db_entry_ttl),
            auth_token: non_empty_var("AUTH_TOKEN"),
        }
    }

    /// Resolves the persistence backend to use.
    ///
    /// A database, when configured with a supported type, wins over file
    /// snapshots. Unknown database types are logged and ignored.
    pub fn persistence(&self) -> PersistenceMode {
        match self.db_type.as_deref() {
            Some(db_type) if db_type.eq_ignore_ascii_case("sqlite") => {
                return PersistenceMode::Sqlite {
                    path: PathBuf::from(&self.db_dsn),
                    entry_ttl: self.db_entry_ttl,
                };
            }
            Some(db_type) => {
                warn!(db_type, "unsupported DB_TYPE, ignoring database persistence");
            }
            None => {}
        }

        if self.enable_persistence {
            PersistenceMode::File {
                path: self.snapshot_path.clone(),
            }
        } else {
            PersistenceMode::Disabled
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            shard_count: SHARD_COUNT,
            enable_persistence: false,
            snapshot_path: PathBuf::from("data.json"),
            snapshot_interval: 0,
            db_type: None,
            db_dsn: "cache.db".to_string(),
            db_entry_ttl: 86_400,
            auth_token: None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
