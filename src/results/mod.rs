//! Quote types and the container that merges and ranks them
//!
//! This module defines the core value types shared by providers, the
//! aggregator and the web layer.

mod container;
mod types;

pub use container::{compare_quotes, rank_quotes, QuoteContainer};
pub use types::*;
