//! Store Module
//!
//! Sharded in-memory key-value storage with lazy TTL expiration and a
//! list payload type sharing the same keyspace.

mod entry;
mod list;
mod routing;
mod shard;
mod sharded;
mod stats;


// Re-export public types
pub use entry::{Entry, ListHandle, Value};
pub use list::List;
pub use routing::{fnv1a_32, shard_index};
pub use sharded::{ShardedStore, Snapshot};
pub use stats::StoreStats;

// == Public Constants ==
/// Default number of shards
pub const SHARD_COUNT: usize = 16;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
