//! Shard Cache - A sharded in-memory key-value cache server
//!
//! Provides TTL expiration checked on read, stack-ordered lists sharing the
//! same keyspace, and snapshot persistence to a JSON file or SQLite. A typed
//! HTTP client for the server lives in [`client`].

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod store;
pub mod tasks;

pub use api::{AppState, AuthConfig};
pub use client::{CacheClient, ClientError};
pub use config::{Config, PersistenceMode};
pub use error::CacheError;
pub use store::{ShardedStore, Value};
pub use tasks::spawn_snapshot_task;
