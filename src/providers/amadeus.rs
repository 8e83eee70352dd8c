//! Amadeus flight offers provider

use super::traits::*;
use crate::network::HttpClient;
use crate::results::Quote;
use crate::search::SearchQuery;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Amadeus self-service flight offers search
pub struct Amadeus {
    client: HttpClient,
    base_url: String,
    token: String,
    max_offers: u32,
}

impl Amadeus {
    pub fn new(client: HttpClient, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            max_offers: 3,
        }
    }

    /// Limit the number of offers requested per search
    pub fn with_max_offers(mut self, max: u32) -> Self {
        self.max_offers = max;
        self
    }

    fn parse_offers(&self, response: OffersResponse, query: &SearchQuery) -> ProviderResult<Vec<Quote>> {
        let mut quotes = Vec::with_capacity(response.data.len());

        for offer in response.data {
            let Some(itinerary) = offer.itineraries.first() else {
                continue;
            };
            let (Some(first), Some(last)) = (itinerary.segments.first(), itinerary.segments.last())
            else {
                continue;
            };

            let departure = NaiveDateTime::parse_from_str(&first.departure.at, TIME_FORMAT);
            let arrival = NaiveDateTime::parse_from_str(&last.arrival.at, TIME_FORMAT);
            let (Ok(departure), Ok(arrival)) = (departure, arrival) else {
                debug!("Skipping Amadeus offer {} with unparsable times", offer.id);
                continue;
            };

            let price = match Decimal::from_str(&offer.price.grand_total) {
                Ok(price) => price,
                Err(e) => {
                    debug!(
                        "Skipping Amadeus offer {} with grandTotal {:?}: {}",
                        offer.id, offer.price.grand_total, e
                    );
                    continue;
                }
            };

            let built = Quote::builder(self.name())
                .airline(&first.carrier_code)
                .price(price)
                .currency(&offer.price.currency)
                .route(query.origin(), query.destination())
                .departure_at(departure)
                .arrival_at(arrival)
                .build();
            match built {
                Ok(quote) => quotes.push(quote),
                Err(e) => debug!("Skipping Amadeus offer {}: {}", offer.id, e),
            }
        }

        if quotes.is_empty() {
            return Err(ProviderError::NoQuotes(query.route()));
        }
        Ok(quotes)
    }
}

#[async_trait]
impl Provider for Amadeus {
    fn name(&self) -> &str {
        "Amadeus"
    }

    async fn search(&self, query: &SearchQuery) -> ProviderResult<Vec<Quote>> {
        let url = format!("{}/v2/shopping/flight-offers", self.base_url);
        let params = [
            ("originLocationCode", query.origin().to_string()),
            ("destinationLocationCode", query.destination().to_string()),
            ("departureDate", query.start_date().format("%Y-%m-%d").to_string()),
            ("returnDate", query.end_date().format("%Y-%m-%d").to_string()),
            ("adults", "1".to_string()),
            ("max", self.max_offers.to_string()),
        ];

        let response: OffersResponse = self
            .client
            .get_json(&url, &params, Some(&self.token))
            .await?;
        self.parse_offers(response, query)
    }
}

/// Exchange client credentials for an Amadeus access token
pub async fn fetch_access_token(
    client: &HttpClient,
    auth_url: &str,
    client_id: &str,
    client_secret: &str,
) -> ProviderResult<String> {
    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];

    let token: TokenResponse = client
        .post_form(auth_url, &form)
        .await
        .map_err(|e| ProviderError::Auth(e.to_string()))?;

    if token.access_token.is_empty() {
        return Err(ProviderError::Auth("empty access token".to_string()));
    }
    debug!("Obtained Amadeus token valid for {}s", token.expires_in);
    Ok(token.access_token)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<FlightOffer>,
}

#[derive(Debug, Deserialize)]
struct FlightOffer {
    #[serde(default)]
    id: String,
    #[serde(default)]
    itineraries: Vec<Itinerary>,
    price: OfferPrice,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Segment {
    departure: Endpoint,
    arrival: Endpoint,
    #[serde(default)]
    carrier_code: String,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferPrice {
    currency: String,
    grand_total: String,
}
