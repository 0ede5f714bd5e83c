//! Timestamp utilities and the clock abstraction
//!
//! The Event Store and the Aggregator read "now" through a [`Clock`] so that
//! tests can pin time with [`ManualClock`].

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Milliseconds since the Unix epoch (storage representation)
pub fn to_epoch_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Milliseconds since the Unix epoch, rounded up
///
/// Stored write times use this so a stored instant is never earlier than the
/// moment it was taken.
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use persona_common::time::to_epoch_millis_ceil;
///
/// let instant = Utc.timestamp_millis_opt(1_000).unwrap() + Duration::microseconds(1);
/// assert_eq!(to_epoch_millis_ceil(instant), 1_001);
/// ```
pub fn to_epoch_millis_ceil(timestamp: DateTime<Utc>) -> i64 {
    let millis = timestamp.timestamp_millis();
    if timestamp.timestamp_subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    }
}

/// Inverse of [`to_epoch_millis`]; out-of-range values collapse to the epoch
pub fn from_epoch_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests
///
/// Clones share the same underlying instant.
#[derive(Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(to_epoch_millis(start))),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.millis.store(to_epoch_millis(instant), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock").field("now", &Clock::now(self)).finish()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        from_epoch_millis(self.millis.load(Ordering::SeqCst))
    }
}
