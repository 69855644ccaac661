//! # ReapKV - A Sharded In-Process Key-Value Cache
//!
//! ReapKV is a concurrent, in-memory key-value cache for embedding in Rust
//! programs. Keys may carry a time-to-live, and expired entries are removed
//! by an explicit, caller-triggered reap pass that sweeps the shards with
//! bounded concurrency.
//!
//! ## Features
//!
//! - **Sharded Storage**: A fixed number of independently locked shards
//! - **TTL Support**: Per-key expiry, or none at all
//! - **Explicit Reaping**: Nothing is evicted until you call [`Store::reap`]
//! - **Bounded Concurrency**: A reap never sweeps more than R shards at once
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               Store                                     │
//! │                                                                         │
//! │  set / get / delete ──> KeyRouter ──┐                                   │
//! │                         (CRC-32)    │                                   │
//! │                                     ▼                                   │
//! │            ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐                  │
//! │            │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │                  │
//! │            │RwLock  │ │RwLock  │ │RwLock  │ │shards  │                  │
//! │            └────────┘ └────────┘ └────────┘ └────────┘                  │
//! │                ▲          ▲          ▲          ▲                       │
//! │                └──────────┴────┬─────┴──────────┘                       │
//! │                                │                                        │
//! │                   ┌────────────┴────────────┐                           │
//! │                   │   reap(collect)         │                           │
//! │                   │   ≤ R scoped workers    │                           │
//! │                   └─────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use reapkv::{Store, StoreConfig};
//! use std::time::Duration;
//!
//! let store: Store<String> = Store::new(
//!     StoreConfig::default()
//!         .with_shard_count(32)
//!         .with_reap_concurrency(4),
//! )
//! .unwrap();
//!
//! store.set("name", "Ariz".to_string(), Duration::ZERO);
//! store.set("session", "abc123".to_string(), Duration::from_secs(3600));
//!
//! assert_eq!(store.get("name").as_deref(), Some("Ariz"));
//! assert_eq!(store.len(), 2);
//!
//! // Run this whenever suits your application
//! let deleted = store.reap(true);
//! assert!(deleted.is_empty());
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: Shards, routing, clocks, and the store itself
//! - [`config`]: Store configuration
//! - [`error`]: Error types
//!
//! ## Design Highlights
//!
//! ### Thread Safety
//!
//! Each shard owns one RwLock and never takes another shard's lock. Reads on
//! a shard run concurrently; writes to different shards never block each
//! other.
//!
//! ### Explicit Expiry
//!
//! `get`, `keys` and `len` never look at TTLs. An expired entry stays fully
//! visible until a reap removes it, so eviction happens exactly when the
//! application decides.

pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use storage::{BytesStore, Clock, CoarseClock, ManualClock, Store, StoreStats};

/// Version of ReapKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
