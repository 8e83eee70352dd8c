//! Metrics collection module
//!
//! Tracks provider performance, error rates and cache effectiveness.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

/// Response times kept per provider
const RESPONSE_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    calls: u64,
    successes: u64,
    errors: u64,
    timeouts: u64,
    response_times: VecDeque<u64>,
}

/// Aggregator-wide metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    total_searches: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    providers: RwLock<HashMap<String, ProviderCounters>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a provider call that returned quotes (possibly none)
    pub fn record_success(&self, provider: &str, time_ms: u64) {
        self.with_provider(provider, |c| {
            c.calls += 1;
            c.successes += 1;
            push_response_time(c, time_ms);
        });
    }

    /// Record a provider call that returned an error
    pub fn record_error(&self, provider: &str, time_ms: u64) {
        self.with_provider(provider, |c| {
            c.calls += 1;
            c.errors += 1;
            push_response_time(c, time_ms);
        });
    }

    /// Record a provider call cut off by the search deadline
    pub fn record_timeout(&self, provider: &str) {
        self.with_provider(provider, |c| {
            c.calls += 1;
            c.timeouts += 1;
        });
    }

    /// Get total searches
    pub fn get_total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Get average response time for a provider
    pub fn get_avg_response_time(&self, provider: &str) -> Option<u64> {
        let providers = self.providers.read();
        providers.get(provider).and_then(avg_response_time)
    }

    /// Get reliability percentage for a provider
    pub fn get_reliability(&self, provider: &str) -> f64 {
        let providers = self.providers.read();
        providers.get(provider).map(reliability).unwrap_or(100.0)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let providers = self.providers.read();
        MetricsSnapshot {
            total_searches: self.total_searches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            providers: providers
                .iter()
                .map(|(name, c)| {
                    (
                        name.clone(),
                        ProviderStats {
                            calls: c.calls,
                            successes: c.successes,
                            errors: c.errors,
                            timeouts: c.timeouts,
                            avg_response_time: avg_response_time(c),
                            reliability: reliability(c),
                        },
                    )
                })
                .collect(),
        }
    }

    fn with_provider(&self, provider: &str, f: impl FnOnce(&mut ProviderCounters)) {
        let mut providers = self.providers.write();
        f(providers.entry(provider.to_string()).or_default());
    }
}

fn push_response_time(counters: &mut ProviderCounters, time_ms: u64) {
    if counters.response_times.len() >= RESPONSE_WINDOW {
        counters.response_times.pop_front();
    }
    counters.response_times.push_back(time_ms);
}

fn avg_response_time(counters: &ProviderCounters) -> Option<u64> {
    if counters.response_times.is_empty() {
        None
    } else {
        Some(counters.response_times.iter().sum::<u64>() / counters.response_times.len() as u64)
    }
}

fn reliability(counters: &ProviderCounters) -> f64 {
    if counters.calls == 0 {
        100.0
    } else {
        (counters.successes as f64 / counters.calls as f64) * 100.0
    }
}

/// Serializable view of [`Metrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub providers: BTreeMap<String, ProviderStats>,
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub calls: u64,
    pub successes: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_search();
        metrics.record_success("amadeus", 100);
        metrics.record_success("amadeus", 300);
        metrics.record_error("amadeus", 50);
        metrics.record_timeout("amadeus");

        assert_eq!(metrics.get_total_searches(), 1);
        assert_eq!(metrics.get_avg_response_time("amadeus"), Some(150));
        assert_eq!(metrics.get_reliability("amadeus"), 50.0);
        assert_eq!(metrics.get_reliability("unknown"), 100.0);
    }

    #[test]
    fn test_response_window_is_bounded() {
        let metrics = Metrics::new();
        for _ in 0..RESPONSE_WINDOW {
            metrics.record_success("mock", 1000);
        }
        for _ in 0..RESPONSE_WINDOW {
            metrics.record_success("mock", 10);
        }
        assert_eq!(metrics.get_avg_response_time("mock"), Some(10));
    }

    #[test]
    fn test_snapshot() {
        let metrics = Metrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        metrics.record_timeout("slow");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 2);
        assert_eq!(snapshot.providers["slow"].timeouts, 1);
        assert_eq!(snapshot.providers["slow"].avg_response_time, None);
    }
}
