//! Synthetic provider that fabricates quotes without network access

use super::traits::*;
use crate::results::Quote;
use crate::search::SearchQuery;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveTime};
use rand::Rng;
use rust_decimal::Decimal;
use std::time::Duration;

/// Provider returning one random quote after a random delay
pub struct MockProvider {
    name: String,
    min_latency: Duration,
    max_latency: Duration,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_latency: Duration::from_millis(200),
            max_latency: Duration::from_millis(600),
        }
    }

    /// Set the simulated response time range
    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.min_latency = min;
        self.max_latency = max.max(min);
        self
    }

    fn fabricate(&self, query: &SearchQuery) -> ProviderResult<Quote> {
        let mut rng = rand::thread_rng();
        let price = Decimal::from(rng.gen_range(500i64..900));
        let hours = rng.gen_range(6..10);

        let departure = query
            .start_date()
            .and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default());
        let arrival = departure + ChronoDuration::hours(hours);

        Ok(Quote::builder(&self.name)
            .airline("MockAir")
            .price(price)
            .currency("USD")
            .route(query.origin(), query.destination())
            .departure_at(departure)
            .arrival_at(arrival)
            .build()?)
    }

    fn latency(&self) -> Duration {
        if self.max_latency <= self.min_latency {
            return self.min_latency;
        }
        rand::thread_rng().gen_range(self.min_latency..=self.max_latency)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &SearchQuery) -> ProviderResult<Vec<Quote>> {
        tokio::time::sleep(self.latency()).await;
        Ok(vec![self.fabricate(query)?])
    }
}
