//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::store::StoreStats;

/// Response body carrying a key and its value (GET /get/:key, POST /list/pop/:key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueResponse {
    /// The requested key
    pub key: String,
    /// The stored (or popped) value; lists are rendered as arrays
    pub value: JsonValue,
}

impl ValueResponse {
    pub fn new(key: impl Into<String>, value: JsonValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the SET operation (POST/PUT /set)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /delete/:key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
    /// Whether an entry was actually removed
    pub existed: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, existed: bool) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
            existed,
        }
    }
}

/// Response body for the list PUSH operation (POST /list/push)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushResponse {
    pub message: String,
    pub key: String,
    /// List length after the push
    pub length: usize,
}

impl PushResponse {
    pub fn new(key: impl Into<String>, length: usize) -> Self {
        let key = key.into();
        Self {
            message: format!("Value pushed to list '{}'", key),
            key,
            length,
        }
    }
}

/// Response body for an explicit snapshot (POST /snapshot)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub message: String,
    /// Number of entries written
    pub entries: usize,
}

impl SnapshotResponse {
    pub fn new(backend: &str, entries: usize) -> Self {
        Self {
            message: format!("Snapshot saved to {} backend", backend),
            entries,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Number of reads that found a live value
    pub hits: u64,
    /// Number of reads that found nothing
    pub misses: u64,
    /// Number of writes
    pub sets: u64,
    /// Number of deletes that removed an entry
    pub deletes: u64,
    /// Current number of physical entries
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Number of store shards
    pub shard_count: usize,
}

impl StatsResponse {
    pub fn new(stats: &StoreStats, shard_count: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            deletes: stats.deletes,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            shard_count,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
