//! Application state shared across handlers

use crate::config::Settings;
use crate::network::HttpClient;
use crate::search::Aggregator;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Fan-out coordinator; providers are installed at login
    pub aggregator: Arc<Aggregator>,
    /// Client handed to vendor providers built at login
    pub client: HttpClient,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, aggregator: Arc<Aggregator>, client: HttpClient) -> Self {
        Self {
            settings: Arc::new(settings),
            aggregator,
            client,
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
