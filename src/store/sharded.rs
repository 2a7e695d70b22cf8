//! Sharded Store Module
//!
//! Public face of the cache: routes each key to one shard and exposes
//! set/get/delete, list access and bulk snapshot/restore.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::store::shard::{copy_live, Shard};
use crate::store::stats::StatsCounters;
use crate::store::{shard_index, Entry, ListHandle, StoreStats, Value, MAX_KEY_LENGTH, SHARD_COUNT};

/// Flat copy of store contents, keyed by store key.
pub type Snapshot = HashMap<String, Entry>;

// == Sharded Store ==
/// Concurrent key-value store partitioned into independently locked shards.
///
/// Operations on keys in different shards never contend. Operations on the
/// same key are serialized by that shard's lock; reads share it.
///
/// Expiration is lazy: an expired entry reads as absent but stays in its
/// shard until it is overwritten or deleted.
#[derive(Debug)]
pub struct ShardedStore {
    shards: Box<[Shard]>,
    stats: StatsCounters,
}

impl ShardedStore {
    // == Constructor ==
    /// Creates a store with the default [`SHARD_COUNT`] shards.
    pub fn new() -> Self {
        Self::with_shard_count(SHARD_COUNT)
    }

    /// Creates a store with `shard_count` shards (at least one).
    pub fn with_shard_count(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Shard::new()).collect();
        Self {
            shards,
            stats: StatsCounters::default(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `key`.
    pub fn shard_index(&self, key: &str) -> usize {
        shard_index(key, self.shards.len())
    }

    fn shard(&self, key: &str) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    // == Set ==
    /// Stores `value` at `key`, overwriting any previous entry.
    ///
    /// A `ttl_seconds` of 0 means the entry never expires. Lists can be
    /// replaced by scalars (and vice versa) through this path.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl_seconds: u64) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;

        let entry = Entry::new(value, ttl_seconds);
        self.shard(&key).insert(key, entry);
        self.stats.record_set();
        Ok(())
    }

    // == Get ==
    /// Returns the live value at `key`, or None if absent or expired.
    ///
    /// List payloads are returned as a detached copy.
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = self.shard(key).get(key);
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    // == Delete ==
    /// Removes `key`. Deleting an absent key is not an error.
    ///
    /// Returns true if an entry (live or expired) was removed.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.shard(key).remove(key);
        if removed {
            self.stats.record_delete();
        }
        removed
    }

    // == Get List ==
    /// Returns the list at `key`, creating an empty non-expiring one if the
    /// key is absent or expired.
    ///
    /// The handle stays valid after the call and may be used without any
    /// shard lock. If the key is later overwritten or deleted, the handle
    /// keeps working but is detached from the store.
    pub fn get_list(&self, key: &str) -> Result<ListHandle> {
        validate_key(key)?;
        self.shard(key).get_or_create_list(key)
    }

    /// Pushes `value` onto the list at `key`, creating the list if needed.
    ///
    /// Returns the list length after the push.
    pub fn push(&self, key: &str, value: JsonValue) -> Result<usize> {
        Ok(self.get_list(key)?.push(value))
    }

    /// Pops the most recently pushed value from the list at `key`.
    ///
    /// Like the handle path, this creates an empty list at an absent key.
    pub fn pop(&self, key: &str) -> Result<Option<JsonValue>> {
        Ok(self.get_list(key)?.pop())
    }

    // == Snapshot All ==
    /// Copies every live entry into one flat map.
    ///
    /// Shards are visited in index order, each under its read lock, and each
    /// lock is released before the next shard is read. The result is
    /// therefore not a point-in-time view of the whole store: a write to a
    /// later shard that lands during the walk is included, a write to an
    /// earlier shard is missed. Use [`Self::snapshot_consistent`] when that
    /// matters.
    pub fn snapshot_all(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for shard in self.shards.iter() {
            let entries = shard.read();
            copy_live(&entries, Utc::now(), &mut snapshot);
        }
        debug!(entries = snapshot.len(), "snapshot taken");
        snapshot
    }

    /// Copies every live entry while holding all shard read locks.
    ///
    /// Locks are acquired in index order and released together, giving a
    /// point-in-time view at the cost of blocking writers on every shard for
    /// the duration of the copy.
    pub fn snapshot_consistent(&self) -> Snapshot {
        let guards: Vec<_> = self.shards.iter().map(Shard::read).collect();
        let now = Utc::now();

        let mut snapshot = Snapshot::new();
        for entries in &guards {
            copy_live(entries, now, &mut snapshot);
        }
        drop(guards);

        debug!(entries = snapshot.len(), "consistent snapshot taken");
        snapshot
    }

    // == Restore All ==
    /// Inserts every entry of `snapshot`, overwriting existing keys.
    ///
    /// Keys are rerouted with this store's shard count, so restoring into a
    /// store of a different size is safe. Entries that are already expired or
    /// have invalid keys are skipped. Returns the number of entries inserted.
    pub fn restore_all(&self, snapshot: Snapshot) -> usize {
        let now = Utc::now();
        let mut restored = 0;

        for (key, entry) in snapshot {
            if entry.is_expired_at(now) || validate_key(&key).is_err() {
                debug!(%key, "skipping entry during restore");
                continue;
            }
            self.shard(&key).insert(key, entry);
            restored += 1;
        }

        debug!(restored, "snapshot restored");
        restored
    }

    // == Length ==
    /// Number of physical entries across all shards, including expired
    /// entries that have not been overwritten or deleted.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> StoreStats {
        self.stats.snapshot(self.len())
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects empty keys and keys longer than [`MAX_KEY_LENGTH`] bytes.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
