//! Fare Aggregator: a flight-price fan-out service written in Rust
//!
//! A search is broadcast concurrently to every registered provider under one
//! shared deadline. Whatever quotes come back in time are merged, ranked by
//! price then duration, and memoized in a short-lived TTL cache.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use providers::Provider;
pub use results::{AggregatedResult, Quote};
pub use search::{Aggregator, SearchQuery};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default deadline for one fan-out in seconds
pub const DEFAULT_TIMEOUT: u64 = 10;

/// Default lifetime of a cached result in seconds (twice the timeout)
pub const DEFAULT_CACHE_TTL: u64 = 2 * DEFAULT_TIMEOUT;
