//! Settings structures for fare aggregator configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub auth: AuthSettings,
    pub outgoing: OutgoingSettings,
    pub providers: ProvidersSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (FARE_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_from(|key| std::env::var(key).ok());
    }

    fn merge_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("FARE_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("FARE_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("FARE_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("FARE_JWT_SECRET") {
            self.auth.jwt_secret = val;
        }
        if let Some(val) = var("FARE_AMADEUS_CLIENT_ID") {
            self.providers.amadeus.client_id = val;
        }
        if let Some(val) = var("FARE_AMADEUS_CLIENT_SECRET") {
            self.providers.amadeus.client_secret = val;
        }
        if let Some(val) = var("FARE_AMADEUS_BASE_URL") {
            self.providers.amadeus.base_url = val;
        }
        if let Some(val) = var("FARE_SERPAPI_KEY") {
            self.providers.google_flights.api_key = val;
        }
        if let Some(val) = var("FARE_GOOGLE_FLIGHTS_BASE_URL") {
            self.providers.google_flights.base_url = val;
        }
    }

    /// Reject unusable timing values. Returns warnings for settings that
    /// work but defeat the cache, each also logged.
    pub fn validate(&self) -> Result<Vec<String>> {
        let search = &self.search;
        if search.timeout_secs == 0
            || search.cache_ttl_secs == 0
            || search.sweep_interval_secs == 0
            || search.poll_interval_secs == 0
        {
            bail!("search timings must be non-zero: {:?}", search);
        }

        let mut warnings = Vec::new();
        if search.poll_interval_secs < search.cache_ttl_secs {
            warnings.push(format!(
                "Poll interval {}s is shorter than cache TTL {}s; streams will repeat cached results",
                search.poll_interval_secs, search.cache_ttl_secs
            ));
        }
        for warning in &warnings {
            warn!("{}", warning);
        }
        Ok(warnings)
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by /health
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "fare-aggregator".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Aggregation timing.
///
/// The cache TTL is twice the search timeout, and the stream poll interval
/// is longer than the TTL so each poll reaches the providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Deadline for one fan-out, shared by all providers
    pub timeout_secs: u64,
    /// How long an aggregated result is served from cache
    pub cache_ttl_secs: u64,
    /// Period of the expired-entry sweep
    pub sweep_interval_secs: u64,
    /// Period of the SSE re-search
    pub poll_interval_secs: u64,
}

impl SearchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: crate::DEFAULT_TIMEOUT,
            cache_ttl_secs: crate::DEFAULT_CACHE_TTL,
            sweep_interval_secs: 60,
            poll_interval_secs: 30,
        }
    }
}

/// Login and token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC secret for issued tokens
    pub jwt_secret: String,
    /// Lifetime of issued tokens in seconds
    pub token_ttl_secs: u64,
    pub username: String,
    pub password: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "devsecret".to_string(),
            token_ttl_secs: 3600,
            username: "admin".to_string(),
            password: "secret".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Hard cap on a single HTTP request, in seconds
    pub request_timeout_secs: f64,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy for all outgoing requests
    pub proxy: Option<String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60.0,
            verify_ssl: true,
            proxy: None,
        }
    }
}

/// Per-vendor provider settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersSettings {
    pub amadeus: AmadeusSettings,
    pub google_flights: GoogleFlightsSettings,
    pub mock: MockSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmadeusSettings {
    pub enabled: bool,
    pub base_url: String,
    /// OAuth2 client-credentials endpoint
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Offers requested per search
    pub max_offers: u32,
}

impl AmadeusSettings {
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl Default for AmadeusSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://test.api.amadeus.com".to_string(),
            auth_url: "https://test.api.amadeus.com/v1/security/oauth2/token".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            max_offers: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleFlightsSettings {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    pub currency: String,
}

impl GoogleFlightsSettings {
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }
}

impl Default for GoogleFlightsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://serpapi.com/search.json".to_string(),
            api_key: String::new(),
            currency: "USD".to_string(),
        }
    }
}

/// Synthetic providers registered at login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    pub names: Vec<String>,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            names: vec!["Ports Airlines".to_string()],
            min_latency_ms: 200,
            max_latency_ms: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.general.debug);
        assert_eq!(settings.search.timeout(), Duration::from_secs(10));
        assert_eq!(settings.search.cache_ttl(), Duration::from_secs(20));
        assert_eq!(settings.validate().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
search:
  timeout_secs: 5
providers:
  mock:
    names: ["Sky Mock", "Sea Mock"]
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.search.timeout_secs, 5);
        assert_eq!(settings.search.cache_ttl_secs, 20);
        assert_eq!(settings.providers.mock.names.len(), 2);
        assert_eq!(settings.providers.mock.min_latency_ms, 200);
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FARE_PORT", "9090"),
            ("FARE_JWT_SECRET", "s3cret"),
            ("FARE_SERPAPI_KEY", "serp"),
            ("FARE_DEBUG", "true"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.merge_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.auth.jwt_secret, "s3cret");
        assert!(settings.general.debug);
        assert!(settings.providers.google_flights.is_configured());
        assert!(!settings.providers.amadeus.is_configured());
    }

    #[test]
    fn test_poll_shorter_than_ttl_warns() {
        let mut settings = Settings::default();
        settings.search.poll_interval_secs = 5;

        let warnings = settings.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Poll interval 5s"));
    }

    #[test]
    fn test_zero_timing_rejected() {
        let mut settings = Settings::default();
        settings.search.timeout_secs = 0;
        assert!(settings.validate().is_err());
    }
}
