//! Provider loader for building the providers registered at login

use super::amadeus::{self, Amadeus};
use super::google_flights::GoogleFlights;
use super::mock::MockProvider;
use super::traits::{Provider, ProviderResult};
use crate::config::Settings;
use crate::network::HttpClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Builds providers from configuration
pub struct ProviderLoader;

impl ProviderLoader {
    /// Build every provider enabled in `settings`.
    ///
    /// Amadeus needs a token exchange first; its failure fails the whole
    /// load so the caller can report the upstream as unavailable.
    pub async fn load_for_login(
        settings: &Settings,
        client: &HttpClient,
    ) -> ProviderResult<Vec<Arc<dyn Provider>>> {
        let mut providers: Vec<Arc<dyn Provider>> = Vec::new();
        let config = &settings.providers;

        if config.amadeus.is_configured() {
            let token = amadeus::fetch_access_token(
                client,
                &config.amadeus.auth_url,
                &config.amadeus.client_id,
                &config.amadeus.client_secret,
            )
            .await?;
            let provider = Amadeus::new(client.clone(), &config.amadeus.base_url, token)
                .with_max_offers(config.amadeus.max_offers);
            info!("Loaded provider: {}", provider.name());
            providers.push(Arc::new(provider));
        } else if config.amadeus.enabled {
            warn!("Amadeus enabled but client credentials are missing, skipping");
        }

        if config.google_flights.is_configured() {
            let provider = GoogleFlights::new(
                client.clone(),
                &config.google_flights.base_url,
                &config.google_flights.api_key,
            )
            .with_currency(&config.google_flights.currency);
            info!("Loaded provider: {}", provider.name());
            providers.push(Arc::new(provider));
        } else if config.google_flights.enabled {
            warn!("Google Flights enabled but no API key is set, skipping");
        }

        for name in &config.mock.names {
            let provider = MockProvider::new(name).with_latency(
                Duration::from_millis(config.mock.min_latency_ms),
                Duration::from_millis(config.mock.max_latency_ms),
            );
            info!("Loaded provider: {} (synthetic)", name);
            providers.push(Arc::new(provider));
        }

        Ok(providers)
    }
}
