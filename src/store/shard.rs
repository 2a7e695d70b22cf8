//! Shard Module
//!
//! One independently locked partition of the keyspace.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::error::{CacheError, Result};
use crate::store::{Entry, List, ListHandle, Value};

// == Shard ==
/// A key -> entry map guarded by its own reader/writer lock.
///
/// Every method takes the lock for exactly one operation and never calls out
/// while holding it.
#[derive(Debug, Default)]
pub(crate) struct Shard {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    // Map updates are single inserts/removes, so a poisoned lock still guards a consistent map.
    pub fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    // == Get ==
    /// Returns a detached copy of the live value at `key`.
    ///
    /// Expired entries read as absent but are left in place.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.read();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.detached())
    }

    // == Insert ==
    /// Inserts or overwrites the entry at `key`.
    pub fn insert(&self, key: String, entry: Entry) {
        self.write().insert(key, entry);
    }

    // == Remove ==
    /// Removes the entry at `key`, returning whether one was physically present.
    pub fn remove(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    // == Get Or Create List ==
    /// Returns the list stored at `key`, creating an empty one if the key is
    /// absent or expired.
    ///
    /// Fails with [`CacheError::TypeMismatch`] when a live scalar occupies the key.
    pub fn get_or_create_list(&self, key: &str) -> Result<ListHandle> {
        let mut entries = self.write();

        if let Some(entry) = entries.get(key) {
            if !entry.is_expired() {
                return match &entry.value {
                    Value::List(list) => Ok(Arc::clone(list)),
                    Value::Scalar(_) => Err(CacheError::TypeMismatch(key.to_string())),
                };
            }
        }

        let list = Arc::new(List::new());
        entries.insert(
            key.to_string(),
            Entry::persistent(Value::List(Arc::clone(&list))),
        );
        Ok(list)
    }

    /// Number of physical entries, including expired ones not yet overwritten.
    pub fn len(&self) -> usize {
        self.read().len()
    }
}

/// Copies every entry live at `now` into `out`, detaching list storage.
pub(crate) fn copy_live(
    entries: &HashMap<String, Entry>,
    now: DateTime<Utc>,
    out: &mut HashMap<String, Entry>,
) {
    out.extend(
        entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.detached())),
    );
}
