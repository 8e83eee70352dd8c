//! Google Flights provider via the SerpAPI JSON endpoint

use super::traits::*;
use crate::network::HttpClient;
use crate::results::Quote;
use crate::search::SearchQuery;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Google Flights results scraped through SerpAPI
pub struct GoogleFlights {
    client: HttpClient,
    base_url: String,
    api_key: String,
    currency: String,
}

impl GoogleFlights {
    pub fn new(client: HttpClient, base_url: &str, api_key: impl Into<String>) -> Self {
        let base_url = if base_url.starts_with("http") {
            base_url.to_string()
        } else {
            format!("https://{}", base_url)
        };

        Self {
            client,
            base_url,
            api_key: api_key.into(),
            currency: "USD".to_string(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Convert one option. Options without legs, parsable times or a
    /// positive price are skipped.
    fn to_quote(&self, option: &FlightOption) -> Option<Quote> {
        let (first, last) = (option.flights.first()?, option.flights.last()?);

        let departure = NaiveDateTime::parse_from_str(&first.departure_airport.time, TIME_FORMAT);
        let arrival = NaiveDateTime::parse_from_str(&last.arrival_airport.time, TIME_FORMAT);
        let (Ok(departure), Ok(arrival)) = (departure, arrival) else {
            debug!("Skipping Google Flights option with unparsable times");
            return None;
        };

        let price = match option.price.and_then(Decimal::from_f64_retain) {
            Some(price) if price > Decimal::ZERO => price.round_dp(2),
            _ => {
                debug!("Skipping Google Flights option with price {:?}", option.price);
                return None;
            }
        };

        Quote::builder(self.name())
            .airline(&first.airline)
            .price(price)
            .currency(&self.currency)
            .route(&first.departure_airport.id, &last.arrival_airport.id)
            .departure_at(departure)
            .arrival_at(arrival)
            .build()
            .map_err(|e| debug!("Skipping Google Flights option: {}", e))
            .ok()
    }
}

#[async_trait]
impl Provider for GoogleFlights {
    fn name(&self) -> &str {
        "GoogleFlights"
    }

    async fn search(&self, query: &SearchQuery) -> ProviderResult<Vec<Quote>> {
        let params = [
            ("engine", "google_flights".to_string()),
            ("departure_id", query.origin().to_string()),
            ("arrival_id", query.destination().to_string()),
            ("outbound_date", query.start_date().format("%Y-%m-%d").to_string()),
            ("return_date", query.end_date().format("%Y-%m-%d").to_string()),
            ("currency", self.currency.clone()),
            ("hl", "en".to_string()),
            ("api_key", self.api_key.clone()),
        ];

        let response: FlightsResponse = self.client.get_json(&self.base_url, &params, None).await?;

        let quotes: Vec<Quote> = response
            .best_flights
            .iter()
            .chain(&response.other_flights)
            .filter_map(|option| self.to_quote(option))
            .collect();

        if quotes.is_empty() {
            return Err(ProviderError::NoQuotes(query.route()));
        }
        Ok(quotes)
    }
}

#[derive(Debug, Deserialize)]
struct FlightsResponse {
    #[serde(default)]
    best_flights: Vec<FlightOption>,
    #[serde(default)]
    other_flights: Vec<FlightOption>,
}

#[derive(Debug, Deserialize)]
struct FlightOption {
    #[serde(default)]
    flights: Vec<Leg>,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    departure_airport: Airport,
    arrival_airport: Airport,
    #[serde(default)]
    airline: String,
}

#[derive(Debug, Deserialize)]
struct Airport {
    #[serde(default)]
    id: String,
    time: String,
}
