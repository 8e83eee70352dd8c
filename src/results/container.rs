//! Quote container for merging and ranking per-provider outcomes

use super::types::*;
use std::cmp::Ordering;

/// Collects quotes and failures from every provider of one search
#[derive(Debug, Default)]
pub struct QuoteContainer {
    quotes: Vec<Quote>,
    contributors: Vec<String>,
    unresponsive: Vec<UnresponsiveProvider>,
}

impl QuoteContainer {
    /// Create a new empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a provider's quotes. An empty batch contributes nothing.
    pub fn add_quotes(&mut self, provider: &str, quotes: Vec<Quote>) {
        if quotes.is_empty() {
            return;
        }
        self.contributors.push(provider.to_string());
        self.quotes.extend(quotes);
    }

    /// Record a provider that failed or timed out
    pub fn add_unresponsive(&mut self, name: String, failure: ProviderFailure) {
        self.unresponsive
            .push(UnresponsiveProvider { name, failure });
    }

    /// Total number of merged quotes
    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    /// Providers that contributed at least one quote
    pub fn contributors(&self) -> &[String] {
        &self.contributors
    }

    pub fn unresponsive(&self) -> &[UnresponsiveProvider] {
        &self.unresponsive
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Rank the merged quotes. `None` when nothing usable was collected.
    pub fn into_result(self) -> Option<AggregatedResult> {
        if self.quotes.is_empty() {
            return None;
        }

        let mut offers = self.quotes;
        rank_quotes(&mut offers);
        Some(AggregatedResult::from_ranked(offers, self.unresponsive))
    }
}

/// Ascending price, ties broken by ascending duration
pub fn compare_quotes(a: &Quote, b: &Quote) -> Ordering {
    a.price()
        .cmp(&b.price())
        .then_with(|| a.duration().cmp(&b.duration()))
}

/// Sort quotes into rank order
pub fn rank_quotes(quotes: &mut [Quote]) {
    quotes.sort_by(compare_quotes);
}
