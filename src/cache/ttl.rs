//! In-memory cache with per-entry expiry and a background sweep

use super::clock::{Clock, SystemClock};
use super::Cache;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Reader/writer-locked map of values with absolute expiry instants
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    /// Create an empty cache on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty cache reading time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Remove every entry whose expiry has passed. Returns how many were removed.
    ///
    /// Holds the write lock for exactly one pass over the map.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<V: Clone + Send + Sync> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> Cache<V> for TtlCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it now rather than waiting for the sweep. Re-check
        // under the write lock since a concurrent set may have replaced it.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        None
    }

    fn set(&self, key: String, value: V, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .write()
            .insert(key, Entry { value, expires_at });
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Start the periodic sweep for `cache`.
///
/// The task holds only a weak reference and exits on the first tick after
/// the cache is dropped. The first sweep runs one `every` after start.
pub fn spawn_sweeper<V>(cache: &Arc<TtlCache<V>>, every: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let weak: Weak<TtlCache<V>> = Arc::downgrade(cache);
    tokio::spawn(async move {
        let mut ticker = interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(cache) = weak.upgrade() else {
                debug!("Cache dropped, stopping sweeper");
                break;
            };
            let removed = cache.purge_expired();
            if removed > 0 {
                debug!("Swept {} expired cache entries", removed);
            }
        }
    })
}
