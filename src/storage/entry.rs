//! Stored entries.

use std::time::{Duration, SystemTime};

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    /// The actual value stored
    pub value: V,
    /// When this entry becomes eligible for reaping (None = never expires)
    pub expires_at: Option<SystemTime>,
}

impl<V> Entry<V> {
    /// Creates an entry that never expires.
    pub fn new(value: V) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates an entry expiring `ttl` after `now`.
    ///
    /// A zero TTL means the entry never expires.
    pub fn with_ttl(value: V, ttl: Duration, now: SystemTime) -> Self {
        if ttl.is_zero() {
            return Self::new(value);
        }
        // A TTL past the end of representable time never expires
        Self {
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    /// Checks whether this entry is due for removal at `now`.
    ///
    /// Only the reaper asks this; reads never do.
    #[inline]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}
