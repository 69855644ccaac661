//! Error types for ReapKV.
//!
//! Almost every store operation is total: missing keys, duplicate keys and
//! no-op deletes are reported through `bool` / `Option` returns. The only
//! failures are a rejected configuration at construction time and a reap
//! task that died on the blocking pool.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The store was configured with zero shards.
    #[error("Configuration Error: shard count must be greater than zero")]
    ZeroShardCount,

    /// The store was configured with zero concurrent reapers.
    #[error("Configuration Error: reap concurrency must be greater than zero")]
    ZeroReapConcurrency,

    /// A reap offloaded with `reap_async` panicked or was cancelled.
    #[error("Reap task failed: {0}")]
    ReapTask(#[from] tokio::task::JoinError),
}

impl Error {
    /// Returns true if this error was raised while validating configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::ZeroShardCount | Error::ZeroReapConcurrency)
    }
}
