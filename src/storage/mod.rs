//! Storage Module
//!
//! This module provides the core storage functionality for ReapKV: a
//! thread-safe, sharded key-value store with TTL support and an explicit,
//! bounded-concurrency reaper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! │        ▲ KeyRouter (CRC-32 % N)                             │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │  reap(collect), caller-invoked
//!              ┌─────────────┴─────────────┐
//!              │  at most R scoped workers │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Storage**: independent shards reduce lock contention
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **TTL Support**: Keys can carry a time-to-live
//! - **Explicit Expiry**: Expired keys stay readable until a reap removes them
//! - **Bounded Reaping**: At most R shards are swept at once
//!
//! ## Example
//!
//! ```
//! use reapkv::storage::{ManualClock, Store};
//! use reapkv::StoreConfig;
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let store: Store<Bytes, ManualClock> =
//!     Store::with_clock(StoreConfig::default(), clock.clone()).unwrap();
//!
//! store.set("session", Bytes::from("token123"), Duration::from_secs(60));
//! clock.advance(Duration::from_secs(61));
//!
//! // Still visible until reaped
//! assert!(store.get("session").is_some());
//! let deleted = store.reap(true);
//! assert_eq!(deleted.get("session"), Some(&Bytes::from("token123")));
//! assert!(store.get("session").is_none());
//! ```

pub mod clock;
pub mod entry;
pub mod router;
pub mod shard;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, CoarseClock, ManualClock};
pub use entry::Entry;
pub use router::{digest, KeyRouter};
pub use shard::{Shard, Sweep};
pub use store::{BytesStore, Store, StoreStats};
