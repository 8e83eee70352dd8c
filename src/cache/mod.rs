//! Caching module for the fare aggregator
//!
//! Provides the short-lived result cache that sits in front of the
//! provider fan-out, plus the clock abstraction it reads time from.

mod clock;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::{spawn_sweeper, TtlCache};

use std::time::Duration;

/// Key/value cache with per-entry expiry.
///
/// All operations are total: a missing or expired key is a miss, never an
/// error, and no call blocks for longer than one sweep pass.
pub trait Cache<V>: Send + Sync {
    /// Get a live value. Entries whose expiry is at or before now are misses.
    fn get(&self, key: &str) -> Option<V>;

    /// Store a value, replacing any previous entry, expiring after `ttl`.
    fn set(&self, key: String, value: V, ttl: Duration);

    /// Drop every entry.
    fn clear(&self);
}
