//! Sharded Store with Bounded-Concurrency Reaping
//!
//! This module implements the store facade: it owns a fixed set of shards,
//! routes every per-key operation to exactly one of them, and coordinates
//! the all-shard reap sweep.
//!
//! ## Design Decisions
//!
//! 1. **Fixed Shard Count**: The number of shards is set at construction and
//!    never changes, so a key always routes to the same shard.
//! 2. **Explicit Expiry**: Reads never check TTLs. An expired entry stays
//!    visible until a caller runs [`Store::reap`].
//! 3. **Bounded Reaping**: A reap sweeps every shard but keeps at most `R`
//!    sweeps in flight, so at most `R` shards are write-locked by the reaper
//!    at any moment and traffic on the rest continues unaffected.
//!
//! ## Reap Protocol
//!
//! ```text
//!        reap(collect)
//!             │
//!             ▼
//!   ┌────────────────────┐
//!   │ reap-exclusion lock│   one reap per store at a time
//!   └─────────┬──────────┘
//!             │ spawn min(R, N) scoped workers
//!     ┌───────┼────────┐
//!     ▼       ▼        ▼
//!  worker  worker   worker    each claims the next shard index
//!     │       │        │      from a shared cursor and sweeps it
//!     ▼       ▼        ▼
//!  ┌──────────────────────┐
//!  │  aggregation lock    │   taken after the shard lock is released
//!  └──────────────────────┘
//!             │ join all workers
//!             ▼
//!        deleted pairs
//! ```
//!
//! Lock order is always: reap-exclusion → one shard lock → aggregation lock.

use crate::config::StoreConfig;
use crate::error::Result;
use crate::storage::clock::{Clock, CoarseClock};
use crate::storage::router::KeyRouter;
use crate::storage::shard::{Shard, Sweep};
use bytes::Bytes;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// A store of raw byte values.
pub type BytesStore = Store<Bytes>;

/// The main key-value store.
///
/// # Thread Safety
///
/// All operations take `&self`; wrap the store in an `Arc` to share it
/// across threads or tasks.
///
/// # Example
///
/// ```
/// use reapkv::{Store, StoreConfig};
/// use std::time::Duration;
///
/// let store: Store<u32> = Store::new(StoreConfig::default()).unwrap();
///
/// store.set("answer", 42, Duration::ZERO);
/// assert_eq!(store.get("answer"), Some(42));
///
/// store.set("session", 7, Duration::from_secs(60));
/// assert!(!store.set_if_absent("session", 8, Duration::ZERO));
///
/// // Nothing has expired yet
/// assert!(store.reap(true).is_empty());
/// ```
pub struct Store<V, C = CoarseClock> {
    /// The shards, fixed for the store's lifetime
    shards: Box<[Shard<V, C>]>,

    /// Maps keys to shard indices
    router: KeyRouter,

    /// Maximum number of shard sweeps in flight during a reap
    reap_concurrency: NonZeroUsize,

    /// Serializes overlapping reap calls
    reap_lock: Mutex<()>,

    /// Reap calls currently past the exclusion lock
    active_reaps: AtomicUsize,

    /// Statistics: highest number of reap calls observed running at once
    peak_reaps: AtomicUsize,

    /// Shard sweeps currently executing
    active_sweeps: AtomicUsize,

    /// Statistics: highest number of simultaneously executing sweeps
    peak_sweeps: AtomicUsize,

    /// Statistics: completed reap calls
    reap_count: AtomicU64,

    /// Statistics: total entries removed by reaps
    reaped_count: AtomicU64,
}

impl<V, C> std::fmt::Debug for Store<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("shards", &self.shards.len())
            .field("reap_concurrency", &self.reap_concurrency)
            .field("reap_count", &self.reap_count.load(Ordering::Relaxed))
            .field("reaped_count", &self.reaped_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl<V> Store<V, CoarseClock>
where
    V: Clone + Send + Sync,
{
    /// Creates a store using the system clock.
    ///
    /// # Errors
    ///
    /// Fails if the configuration has a zero shard count or zero reap
    /// concurrency.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_clock(config, CoarseClock)
    }
}

impl<V, C> Store<V, C>
where
    V: Clone + Send + Sync,
    C: Clock,
{
    /// Creates a store that reads time from `clock`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration has a zero shard count or zero reap
    /// concurrency.
    pub fn with_clock(config: StoreConfig, clock: C) -> Result<Self> {
        let (shard_count, reap_concurrency) = config.validate()?;
        let clock = Arc::new(clock);

        let shards = (0..shard_count.get())
            .map(|index| Shard::new(index, Arc::clone(&clock)))
            .collect();

        debug!(
            shards = shard_count.get(),
            reap_concurrency = reap_concurrency.get(),
            "Store initialized"
        );

        Ok(Self {
            shards,
            router: KeyRouter::new(shard_count),
            reap_concurrency,
            reap_lock: Mutex::new(()),
            active_reaps: AtomicUsize::new(0),
            peak_reaps: AtomicUsize::new(0),
            active_sweeps: AtomicUsize::new(0),
            peak_sweeps: AtomicUsize::new(0),
            reap_count: AtomicU64::new(0),
            reaped_count: AtomicU64::new(0),
        })
    }

    /// Determines which shard a key belongs to.
    #[inline]
    pub fn shard_index(&self, key: &str) -> usize {
        self.router.route(key.as_bytes())
    }

    #[inline]
    fn get_shard(&self, key: &str) -> &Shard<V, C> {
        &self.shards[self.shard_index(key)]
    }

    /// Sets a key, overwriting any existing value.
    ///
    /// A zero `ttl` means the entry never expires; otherwise it becomes
    /// eligible for reaping `ttl` from now.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        self.get_shard(&key).set(key, value, ttl);
    }

    /// Sets a key only if it doesn't already exist.
    ///
    /// An expired entry that hasn't been reaped still counts as existing.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was inserted, `false` if it was present.
    pub fn set_if_absent(&self, key: impl Into<String>, value: V, ttl: Duration) -> bool {
        let key = key.into();
        self.get_shard(&key).set_if_absent(key, value, ttl)
    }

    /// Gets the value for a key.
    ///
    /// Expiry is not checked here: an expired entry is returned until a
    /// reap removes it.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_shard(key).get(key)
    }

    /// Deletes a key. Deleting a missing key is a no-op.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was present.
    pub fn delete(&self, key: &str) -> bool {
        self.get_shard(key).delete(key)
    }

    /// Returns a snapshot of every key, in no particular order.
    ///
    /// Includes expired entries that haven't been reaped yet.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            keys.extend(shard.keys());
        }
        keys
    }

    /// Returns the approximate number of entries.
    ///
    /// Shards are counted one at a time, so concurrent writers can make the
    /// total disagree with any single instant.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Returns true if no shard holds an entry.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the maximum number of concurrent shard sweeps.
    pub fn reap_concurrency(&self) -> usize {
        self.reap_concurrency.get()
    }

    /// Removes every expired entry from every shard.
    ///
    /// Blocks until all shards have been swept. Only one reap runs per store
    /// at a time; a second caller waits for the first to finish. Ordinary
    /// traffic continues on shards that aren't currently being swept.
    ///
    /// # Returns
    ///
    /// If `collect` is true, the removed keys and their values. Otherwise an
    /// empty map.
    pub fn reap(&self, collect: bool) -> HashMap<String, V> {
        let _exclusive = lock(&self.reap_lock);
        let in_flight = self.active_reaps.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_reaps.fetch_max(in_flight, Ordering::SeqCst);
        let started = Instant::now();

        let aggregate = Mutex::new(HashMap::new());
        let removed = AtomicUsize::new(0);
        let cursor = AtomicUsize::new(0);
        let workers = self.reap_concurrency.get().min(self.shards.len());

        let worker = || {
            while let Some(shard) = self.shards.get(cursor.fetch_add(1, Ordering::Relaxed)) {
                let sweep = self.sweep(shard, collect);
                removed.fetch_add(sweep.removed, Ordering::Relaxed);
                if !sweep.collected.is_empty() {
                    lock(&aggregate).extend(sweep.collected);
                }
            }
        };

        if workers == 1 {
            worker();
        } else {
            thread::scope(|scope| {
                for _ in 0..workers {
                    scope.spawn(worker);
                }
            });
        }

        let removed = removed.into_inner();
        self.active_reaps.fetch_sub(1, Ordering::SeqCst);
        self.reap_count.fetch_add(1, Ordering::Relaxed);
        self.reaped_count.fetch_add(removed as u64, Ordering::Relaxed);

        debug!(
            shards = self.shards.len(),
            workers = workers,
            removed = removed,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Reap complete"
        );

        aggregate.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sweeps one shard, tracking how many sweeps are in flight.
    fn sweep(&self, shard: &Shard<V, C>, collect: bool) -> Sweep<V> {
        let active = self.active_sweeps.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_sweeps.fetch_max(active, Ordering::SeqCst);

        let sweep = shard.reap(collect);

        self.active_sweeps.fetch_sub(1, Ordering::SeqCst);

        trace!(
            shard = shard.index(),
            removed = sweep.removed,
            "Shard swept"
        );

        sweep
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.len(),
            reaps: self.reap_count.load(Ordering::Relaxed),
            reaped: self.reaped_count.load(Ordering::Relaxed),
            peak_concurrent_sweeps: self.peak_sweeps.load(Ordering::SeqCst),
            peak_concurrent_reaps: self.peak_reaps.load(Ordering::SeqCst),
        }
    }
}

impl<V, C> Store<V, C>
where
    V: Clone + Send + Sync + 'static,
    C: Clock + 'static,
{
    /// Runs [`Store::reap`] on Tokio's blocking pool.
    ///
    /// Dropping the returned future does not stop a sweep that has already
    /// started.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReapTask`](crate::Error::ReapTask) if the reap
    /// panicked.
    pub async fn reap_async(self: &Arc<Self>, collect: bool) -> Result<HashMap<String, V>> {
        let store = Arc::clone(self);
        let deleted = tokio::task::spawn_blocking(move || store.reap(collect)).await?;
        Ok(deleted)
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of entries currently stored (approximate)
    pub keys: usize,
    /// Completed reap calls
    pub reaps: u64,
    /// Total entries removed by reaps
    pub reaped: u64,
    /// Highest number of shard sweeps observed running at once
    pub peak_concurrent_sweeps: usize,
    /// Highest number of reap calls observed running at once
    pub peak_concurrent_reaps: usize,
}

#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::clock::ManualClock;
    use std::collections::HashSet;

    fn manual_store(shards: usize, reapers: usize) -> (Store<i32, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = StoreConfig::new()
            .with_shard_count(shards)
            .with_reap_concurrency(reapers);
        (Store::with_clock(config, clock.clone()).unwrap(), clock)
    }

    #[test]
    fn test_set_and_get() {
        let store: Store<i32> = Store::new(StoreConfig::default()).unwrap();

        store.set("test", 2, Duration::ZERO);
        assert_eq!(store.get("test"), Some(2));
    }

    #[test]
    fn test_get_nonexistent() {
        let (store, _) = manual_store(8, 2);
        for i in 0..100 {
            assert_eq!(store.get(&format!("missing-{}", i)), None);
        }
    }

    #[test]
    fn test_no_expiry_never_reaped() {
        let (store, clock) = manual_store(8, 2);

        store.set("forever", 1, Duration::ZERO);
        clock.advance(Duration::from_secs(365 * 24 * 3600));

        assert!(store.reap(true).is_empty());
        assert_eq!(store.get("forever"), Some(1));
    }

    #[test]
    fn test_set_if_absent() {
        let (store, _) = manual_store(8, 2);

        assert!(store.set_if_absent("test", 2, Duration::ZERO));
        assert!(store.set_if_absent("test3", 3, Duration::from_secs(1)));
        assert!(!store.set_if_absent("test", 4, Duration::ZERO));

        assert_eq!(store.get("test"), Some(2));
    }

    #[test]
    fn test_routing_is_deterministic() {
        let (store, _) = manual_store(16, 4);

        for i in 0..200 {
            let key = format!("key-{}", i);
            let first = store.shard_index(&key);
            assert!(first < 16);
            for _ in 0..5 {
                assert_eq!(store.shard_index(&key), first);
            }
        }
    }

    #[test]
    fn test_ttl_and_reap() {
        let (store, clock) = manual_store(64, 4);

        store.set("a", 1, Duration::from_secs(1));
        store.set("b", 2, Duration::ZERO);
        assert_eq!(store.len(), 2);

        clock.advance(Duration::from_secs(2));

        // Expired but not yet reaped
        assert_eq!(store.get("a"), Some(1));
        assert_eq!(store.len(), 2);

        let deleted = store.reap(true);
        assert_eq!(deleted, HashMap::from([("a".to_string(), 1)]));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), Some(2));
    }

    #[test]
    fn test_ttl_and_reap_real_clock() {
        let store: Store<i32> = Store::new(StoreConfig::default()).unwrap();

        store.set("test", 2, Duration::from_millis(50));
        store.set("test3", 3, Duration::ZERO);
        assert_eq!(store.len(), 2);

        thread::sleep(Duration::from_millis(100));

        let deleted = store.reap(true);
        assert_eq!(deleted.len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("test"), None);
    }

    #[test]
    fn test_reap_without_collect_returns_empty() {
        let (store, clock) = manual_store(8, 2);

        for i in 0..50 {
            store.set(format!("key-{}", i), i, Duration::from_millis(10));
        }
        clock.advance(Duration::from_millis(10));

        assert!(store.reap(false).is_empty());
        assert!(store.is_empty());
        assert_eq!(store.stats().reaped, 50);
    }

    #[test]
    fn test_delete() {
        let (store, _) = manual_store(8, 2);

        assert!(!store.delete("absent"));

        store.set("test", 2, Duration::ZERO);
        assert!(store.delete("test"));
        assert_eq!(store.get("test"), None);
    }

    #[test]
    fn test_keys() {
        let (store, _) = manual_store(8, 2);

        store.set("test", 2, Duration::ZERO);
        assert_eq!(store.keys(), vec!["test".to_string()]);

        for i in 0..100 {
            store.set(format!("key-{}", i), i, Duration::ZERO);
        }

        let keys = store.keys();
        assert_eq!(keys.len(), store.len());

        let unique: HashSet<_> = keys.into_iter().collect();
        assert_eq!(unique.len(), 101);
        assert!(unique.contains("key-42"));
    }

    #[test]
    fn test_construction_rejects_zero() {
        let zero_shards = Store::<i32>::new(StoreConfig::default().with_shard_count(0));
        assert!(matches!(zero_shards, Err(Error::ZeroShardCount)));

        let zero_reapers = Store::<i32>::new(StoreConfig::default().with_reap_concurrency(0));
        assert!(matches!(zero_reapers, Err(Error::ZeroReapConcurrency)));
    }

    #[test]
    fn test_reap_concurrency_bound() {
        let (store, clock) = manual_store(64, 3);
        let store = Arc::new(store);

        for i in 0..10_000 {
            store.set(format!("key-{}", i), i, Duration::from_millis(1));
        }
        clock.advance(Duration::from_millis(1));

        // Keep writers busy on every shard while reaping
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..2_000 {
                        store.set(format!("live-{}-{}", w, i), i, Duration::ZERO);
                    }
                })
            })
            .collect();

        let deleted = store.reap(true);

        for handle in writers {
            handle.join().unwrap();
        }

        assert_eq!(deleted.len(), 10_000);
        assert_eq!(store.len(), 8_000);

        let stats = store.stats();
        assert!(stats.peak_concurrent_sweeps >= 1);
        assert!(
            stats.peak_concurrent_sweeps <= 3,
            "peak {} exceeded reap concurrency",
            stats.peak_concurrent_sweeps
        );
    }

    #[test]
    fn test_reap_concurrency_larger_than_shards() {
        let (store, clock) = manual_store(2, 16);

        store.set("a", 1, Duration::from_secs(1));
        store.set("b", 2, Duration::from_secs(1));
        clock.advance(Duration::from_secs(1));

        assert_eq!(store.reap(true).len(), 2);
        assert!(store.stats().peak_concurrent_sweeps <= 2);
    }

    #[test]
    fn test_overlapping_reaps_are_serialized() {
        use std::sync::Barrier;

        let (store, clock) = manual_store(32, 4);
        let store = Arc::new(store);
        let mut all = HashMap::new();
        let mut total = 0;

        for round in 0..5 {
            for i in 0..2_000 {
                store.set(format!("key-{}-{}", round, i), i, Duration::from_millis(5));
            }
            clock.advance(Duration::from_millis(5));

            // Release all callers at once so their reaps overlap
            let barrier = Arc::new(Barrier::new(8));
            let reapers: Vec<_> = (0..8)
                .map(|_| {
                    let store = Arc::clone(&store);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        store.reap(true)
                    })
                })
                .collect();

            for handle in reapers {
                let deleted = handle.join().unwrap();
                total += deleted.len();
                all.extend(deleted);
            }
        }

        // Every entry reaped exactly once across all callers
        assert_eq!(total, 10_000);
        assert_eq!(all.len(), 10_000);
        assert_eq!(all.get("key-3-1234"), Some(&1234));

        let stats = store.stats();
        assert_eq!(stats.reaps, 40);
        assert_eq!(stats.peak_concurrent_reaps, 1);
        assert!(
            stats.peak_concurrent_sweeps <= 4,
            "peak {} exceeded one reap's concurrency",
            stats.peak_concurrent_sweeps
        );
    }

    #[test]
    fn test_single_reaper_sweeps_on_caller() {
        let (store, clock) = manual_store(8, 1);

        for i in 0..100 {
            // Even values expire, odd ones live forever
            let ttl = Duration::from_secs((i % 2 == 0) as u64);
            store.set(format!("key-{}", i), i, ttl);
        }
        clock.advance(Duration::from_secs(1));

        let deleted = store.reap(true);
        assert_eq!(deleted.len(), 50);
        assert!(deleted.values().all(|v| v % 2 == 0));
        assert_eq!(store.len(), 50);

        let stats = store.stats();
        assert_eq!(stats.peak_concurrent_sweeps, 1);
        assert_eq!(stats.reaped, 50);
    }

    #[test]
    fn test_single_shard_store() {
        let (store, clock) = manual_store(1, 4);

        store.set("a", 1, Duration::from_secs(1));
        store.set("b", 2, Duration::ZERO);
        assert_eq!(store.shard_index("a"), 0);
        assert_eq!(store.shard_index("b"), 0);

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.reap(true), HashMap::from([("a".to_string(), 1)]));
        assert_eq!(store.keys(), vec!["b".to_string()]);
        assert_eq!(store.stats().peak_concurrent_sweeps, 1);
    }

    #[test]
    fn test_concurrent_access() {
        let store: Arc<Store<String>> = Arc::new(Store::new(StoreConfig::default()).unwrap());
        let mut handles = vec![];

        // Spawn multiple writers
        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    store.set(key.clone(), "value".to_string(), Duration::ZERO);
                    assert_eq!(store.get(&key).as_deref(), Some("value"));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_bytes_store() {
        let store = BytesStore::new(StoreConfig::default()).unwrap();

        store.set("name", Bytes::from("Ariz"), Duration::ZERO);
        assert_eq!(store.get("name"), Some(Bytes::from("Ariz")));
    }

    #[tokio::test]
    async fn test_reap_async() {
        let (store, clock) = manual_store(16, 4);
        let store = Arc::new(store);

        store.set("a", 1, Duration::from_secs(1));
        store.set("b", 2, Duration::ZERO);
        clock.advance(Duration::from_secs(1));

        let deleted = store.reap_async(true).await.unwrap();
        assert_eq!(deleted, HashMap::from([("a".to_string(), 1)]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reap_async_block_on() {
        let (store, clock) = manual_store(4, 2);
        let store = Arc::new(store);
        store.set("a", 1, Duration::from_millis(1));
        clock.advance(Duration::from_millis(1));

        let deleted = tokio_test::block_on(store.reap_async(false)).unwrap();
        assert!(deleted.is_empty());
        assert!(store.is_empty());
    }
}
