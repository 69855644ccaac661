//! A single independently-locked partition of the keyspace.
//!
//! Every operation takes the shard's one `RwLock` for its whole duration and
//! releases it on return. A shard never touches another shard's lock.

use crate::storage::clock::Clock;
use crate::storage::entry::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// The outcome of sweeping one shard.
#[derive(Debug)]
pub struct Sweep<V> {
    /// Number of expired entries removed
    pub removed: usize,
    /// The removed pairs; empty unless the sweep was asked to collect
    pub collected: HashMap<String, V>,
}

/// A single shard containing a portion of the key-value pairs.
#[derive(Debug)]
pub struct Shard<V, C> {
    /// Position of this shard in the store
    index: usize,
    /// The actual data storage
    data: RwLock<HashMap<String, Entry<V>>>,
    /// Shared time source for computing and checking expirations
    clock: Arc<C>,
}

impl<V: Clone, C: Clock> Shard<V, C> {
    /// Creates an empty shard at position `index` reading time from `clock`.
    pub fn new(index: usize, clock: Arc<C>) -> Self {
        Self {
            index,
            data: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Returns this shard's position in the store.
    pub fn index(&self) -> usize {
        self.index
    }

    // Every mutation leaves the map consistent, so a panic in another
    // holder is not a reason to give up on the data.
    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry<V>>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry<V>>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or overwrites a key. A zero TTL means the entry never expires.
    pub fn set(&self, key: String, value: V, ttl: Duration) {
        let mut data = self.write();
        data.insert(key, Entry::with_ttl(value, ttl, self.clock.now()));
    }

    /// Inserts a key only if it is not already present.
    ///
    /// An entry that has expired but not been reaped yet still counts as
    /// present.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was inserted.
    pub fn set_if_absent(&self, key: String, value: V, ttl: Duration) -> bool {
        let mut data = self.write();

        if data.contains_key(&key) {
            return false;
        }

        data.insert(key, Entry::with_ttl(value, ttl, self.clock.now()));
        true
    }

    /// Gets the value for a key, whether or not it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let data = self.read();
        data.get(key).map(|entry| entry.value.clone())
    }

    /// Removes a key.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut data = self.write();
        data.remove(key).is_some()
    }

    /// Removes every entry whose expiry is at or before now.
    ///
    /// When `collect` is false the returned [`Sweep`] carries only the count.
    pub fn reap(&self, collect: bool) -> Sweep<V> {
        let now = self.clock.now();
        let mut collected = HashMap::new();

        let mut data = self.write();
        let before = data.len();

        if collect {
            let expired: Vec<String> = data
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();
            for key in expired {
                if let Some(entry) = data.remove(&key) {
                    collected.insert(key, entry.value);
                }
            }
        } else {
            data.retain(|_, entry| !entry.is_expired_at(now));
        }

        Sweep {
            removed: before - data.len(),
            collected,
        }
    }

    /// Returns a snapshot of every key currently in the shard.
    pub fn keys(&self) -> Vec<String> {
        let data = self.read();
        data.keys().cloned().collect()
    }

    /// Returns the number of entries, including expired ones not yet reaped.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if the shard holds no entries.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
