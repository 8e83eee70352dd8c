//! Search orchestration module
//!
//! Validates queries, fans them out to every registered provider under a
//! shared deadline, and ranks and caches the merged quotes.

mod executor;
mod models;

pub use executor::{AggregationError, Aggregator, ResultCache};
pub use models::*;
