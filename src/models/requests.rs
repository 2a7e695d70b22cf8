//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies. The client
//! module serializes the same types.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Request body for the SET operation (POST/PUT /set)
///
/// # Fields
/// - `key`: The key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: TTL in seconds, 0 or absent = never expires
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    #[serde(default)]
    pub value: JsonValue,
    /// TTL in seconds
    #[serde(default)]
    pub ttl: u64,
}

/// Request body for the list PUSH operation (POST /list/push)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    /// Key of the list
    pub key: String,
    /// Value pushed on top of the list
    #[serde(default)]
    pub value: JsonValue,
}
