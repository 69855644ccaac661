//! Key-based routing to determine shard assignment.
//!
//! Uses a CRC-32 checksum of the key bytes reduced modulo the shard count.
//! The checksum is stable across processes and platforms, unlike the std
//! `DefaultHasher`, so a given key always lands on the same shard for a
//! given shard count.

use std::num::NonZeroUsize;

/// Computes the routing checksum of a key.
#[inline]
pub fn digest(key: &[u8]) -> u32 {
    crc32fast::hash(key)
}

/// Routes keys to shard indices.
#[derive(Debug, Clone, Copy)]
pub struct KeyRouter {
    shard_count: NonZeroUsize,
}

impl KeyRouter {
    /// Creates a router for the given number of shards.
    pub fn new(shard_count: NonZeroUsize) -> Self {
        Self { shard_count }
    }

    /// Routes a key to its shard index, in `0..shard_count`.
    ///
    /// The same key always routes to the same shard.
    #[inline]
    pub fn route(&self, key: &[u8]) -> usize {
        digest(key) as usize % self.shard_count.get()
    }

    /// Returns the total number of shards.
    pub fn shard_count(&self) -> usize {
        self.shard_count.get()
    }
}
