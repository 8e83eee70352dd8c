//! Quote and aggregate result types

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// Rejected quote construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("price must be non-negative, got {0}")]
    NegativePrice(Decimal),
    #[error("arrival {arrival} is before departure {departure}")]
    ArrivalBeforeDeparture {
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
    },
}

/// One priced itinerary from one provider.
///
/// Immutable once built. Construct through [`Quote::builder`], which
/// enforces `arrival >= departure` and derives the duration from the
/// timestamps whenever both are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    provider: String,
    airline: String,
    price: Decimal,
    currency: String,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    duration: Duration,
    departure_at: Option<NaiveDateTime>,
    arrival_at: Option<NaiveDateTime>,
    origin: String,
    destination: String,
}

impl Quote {
    /// Start building a quote attributed to `provider`
    pub fn builder(provider: impl Into<String>) -> QuoteBuilder {
        QuoteBuilder::new(provider)
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn airline(&self) -> &str {
        &self.airline
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Total itinerary time, end minus start
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn departure_at(&self) -> Option<NaiveDateTime> {
        self.departure_at
    }

    pub fn arrival_at(&self) -> Option<NaiveDateTime> {
        self.arrival_at
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}

/// Builder for [`Quote`]
#[derive(Debug, Clone)]
pub struct QuoteBuilder {
    provider: String,
    airline: String,
    price: Decimal,
    currency: String,
    duration: Option<Duration>,
    departure_at: Option<NaiveDateTime>,
    arrival_at: Option<NaiveDateTime>,
    origin: String,
    destination: String,
}

impl QuoteBuilder {
    fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            airline: String::new(),
            price: Decimal::ZERO,
            currency: "USD".to_string(),
            duration: None,
            departure_at: None,
            arrival_at: None,
            origin: String::new(),
            destination: String::new(),
        }
    }

    pub fn airline(mut self, airline: impl Into<String>) -> Self {
        self.airline = airline.into();
        self
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Upstream-reported duration. Ignored when both timestamps are set.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn departure_at(mut self, at: NaiveDateTime) -> Self {
        self.departure_at = Some(at);
        self
    }

    pub fn arrival_at(mut self, at: NaiveDateTime) -> Self {
        self.arrival_at = Some(at);
        self
    }

    pub fn route(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = origin.into();
        self.destination = destination.into();
        self
    }

    /// Validate and freeze the quote
    pub fn build(self) -> Result<Quote, QuoteError> {
        if self.price < Decimal::ZERO {
            return Err(QuoteError::NegativePrice(self.price));
        }

        let duration = match (self.departure_at, self.arrival_at) {
            (Some(departure), Some(arrival)) => (arrival - departure)
                .to_std()
                .map_err(|_| QuoteError::ArrivalBeforeDeparture { departure, arrival })?,
            _ => self.duration.unwrap_or_default(),
        };

        Ok(Quote {
            provider: self.provider,
            airline: self.airline,
            price: self.price,
            currency: self.currency,
            duration,
            departure_at: self.departure_at,
            arrival_at: self.arrival_at,
            origin: self.origin,
            destination: self.destination,
        })
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}

/// Why a provider contributed nothing to a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ProviderFailure {
    /// Still running when the search deadline fired
    Timeout,
    /// Returned an error
    Error(String),
    /// Task panicked or was aborted
    Crashed(String),
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Error(message) => write!(f, "error: {}", message),
            Self::Crashed(message) => write!(f, "crashed: {}", message),
        }
    }
}

/// A provider that failed during one search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresponsiveProvider {
    pub name: String,
    pub failure: ProviderFailure,
}

/// Ranked outcome of one aggregation.
///
/// When `offers` is non-empty both `cheapest` and `fastest` are set and are
/// copies of elements of `offers`. Offers are sorted by ascending price,
/// then ascending duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedResult {
    cheapest: Option<Quote>,
    fastest: Option<Quote>,
    offers: Vec<Quote>,
    unresponsive: Vec<UnresponsiveProvider>,
}

impl AggregatedResult {
    /// Build from offers already in rank order
    pub(crate) fn from_ranked(offers: Vec<Quote>, unresponsive: Vec<UnresponsiveProvider>) -> Self {
        let cheapest = offers.first().cloned();
        // min_by_key keeps the first of equal minima, i.e. the better-ranked one
        let fastest = offers.iter().min_by_key(|q| q.duration()).cloned();

        Self {
            cheapest,
            fastest,
            offers,
            unresponsive,
        }
    }

    pub fn cheapest(&self) -> Option<&Quote> {
        self.cheapest.as_ref()
    }

    pub fn fastest(&self) -> Option<&Quote> {
        self.fastest.as_ref()
    }

    pub fn offers(&self) -> &[Quote] {
        &self.offers
    }

    /// Providers that errored or timed out during this aggregation
    pub fn unresponsive(&self) -> &[UnresponsiveProvider] {
        &self.unresponsive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 12, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_duration_derived_from_timestamps() {
        let quote = Quote::builder("amadeus")
            .price(Decimal::from(100))
            .departure_at(at(8))
            .arrival_at(at(11))
            .duration(Duration::from_secs(60))
            .build()
            .unwrap();

        assert_eq!(quote.duration(), Duration::from_secs(3 * 3600));
    }

    #[test]
    fn test_upstream_duration_used_without_timestamps() {
        let quote = Quote::builder("mock")
            .departure_at(at(8))
            .duration(Duration::from_secs(600))
            .build()
            .unwrap();

        assert_eq!(quote.duration(), Duration::from_secs(600));
    }

    #[test]
    fn test_arrival_before_departure_rejected() {
        let err = Quote::builder("amadeus")
            .departure_at(at(11))
            .arrival_at(at(8))
            .build()
            .unwrap_err();

        assert!(matches!(err, QuoteError::ArrivalBeforeDeparture { .. }));
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = Quote::builder("amadeus")
            .price(Decimal::from(-1))
            .build()
            .unwrap_err();

        assert_eq!(err, QuoteError::NegativePrice(Decimal::from(-1)));
    }

    #[test]
    fn test_quote_serialization() {
        let quote = Quote::builder("amadeus")
            .airline("LA")
            .price(Decimal::new(10050, 2))
            .route("GRU", "JFK")
            .departure_at(at(8))
            .arrival_at(at(10))
            .build()
            .unwrap();

        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["provider"], "amadeus");
        assert_eq!(json["price"], "100.50");
        assert_eq!(json["duration_secs"], 7200);
        assert_eq!(json["departure_at"], "2025-12-01T08:00:00");
    }
}
