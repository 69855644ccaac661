//! Time Sources
//!
//! Expirations only need millisecond-ish precision, so the default clock
//! reads the system wall clock and truncates it to whole milliseconds.
//! Anything implementing [`Clock`] can be plugged into a store instead,
//! which is how the tests drive TTLs without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of wall-clock readings used to compute and compare expirations.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> SystemTime {
        (**self).now()
    }
}

/// The default clock: system time at millisecond precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoarseClock;

impl Clock for CoarseClock {
    #[inline]
    fn now(&self) -> SystemTime {
        let now = SystemTime::now();
        match now.duration_since(UNIX_EPOCH) {
            Ok(since_epoch) => UNIX_EPOCH + Duration::from_millis(since_epoch.as_millis() as u64),
            // Pre-epoch system clock, leave it untruncated
            Err(_) => now,
        }
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// store and keep another to advance.
///
/// # Example
///
/// ```
/// use reapkv::storage::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let before = clock.now();
/// clock.advance(Duration::from_secs(2));
/// assert_eq!(clock.now().duration_since(before).unwrap(), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    /// Milliseconds since the Unix epoch
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock pinned at the Unix epoch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock pinned at the given time, truncated to milliseconds.
    pub fn starting_at(time: SystemTime) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(epoch_millis(time))),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Pins the clock at the given time, truncated to milliseconds.
    pub fn set(&self, time: SystemTime) {
        self.millis.store(epoch_millis(time), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Milliseconds since the Unix epoch; pre-epoch times clamp to zero.
fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}
