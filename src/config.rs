//! Store configuration.
//!
//! Both knobs are fixed for the lifetime of a store. Changing the shard count
//! would re-route previously inserted keys, so there is deliberately no way
//! to do it after construction.

use crate::error::{Error, Result};
use std::num::NonZeroUsize;

/// Default number of shards.
pub const DEFAULT_SHARD_COUNT: usize = 64;

/// Default number of shard sweeps a reap may run at once.
pub const DEFAULT_REAP_CONCURRENCY: usize = 4;

/// Configuration for a [`Store`](crate::storage::Store).
///
/// More shards means more insert throughput while a reap is running, since
/// only shards mid-sweep are exclusively locked. A higher reap concurrency
/// shortens the reap itself at the cost of locking more shards at once.
///
/// # Example
///
/// ```
/// use reapkv::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_shard_count(128)
///     .with_reap_concurrency(8);
/// assert_eq!(config.shard_count, 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of independently locked shards (default: 64)
    pub shard_count: usize,

    /// Maximum number of shard sweeps in flight during a reap (default: 4)
    pub reap_concurrency: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            reap_concurrency: DEFAULT_REAP_CONCURRENCY,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of shards.
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Sets the maximum number of concurrent shard sweeps.
    pub fn with_reap_concurrency(mut self, reap_concurrency: usize) -> Self {
        self.reap_concurrency = reap_concurrency;
        self
    }

    /// Checks both knobs and returns them as non-zero values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroShardCount`] or [`Error::ZeroReapConcurrency`]
    /// if either value is zero.
    pub fn validate(&self) -> Result<(NonZeroUsize, NonZeroUsize)> {
        let shards = NonZeroUsize::new(self.shard_count).ok_or(Error::ZeroShardCount)?;
        let reapers =
            NonZeroUsize::new(self.reap_concurrency).ok_or(Error::ZeroReapConcurrency)?;
        Ok((shards, reapers))
    }
}
