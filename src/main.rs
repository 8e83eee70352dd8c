//! Fare Aggregator: flight-price fan-out service
//!
//! This is the main entry point for the application.

use anyhow::Result;
use fare_aggregator::{
    cache::{spawn_sweeper, TtlCache},
    config,
    network::HttpClient,
    web::{create_router, AppState},
    AggregatedResult, Aggregator,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().skip(1).any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    // Logging comes up before settings so load and validation messages are
    // kept. RUST_LOG wins over the configured debug flag.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let explicit = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let settings = config::load()?;
    if settings.general.debug && !explicit {
        filter_handle.modify(|filter| *filter = EnvFilter::new("debug"))?;
    }

    info!("Starting Fare Aggregator v{}", fare_aggregator::VERSION);
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    let cache = Arc::new(TtlCache::<Arc<AggregatedResult>>::new());
    spawn_sweeper(&cache, settings.search.sweep_interval());
    info!(
        "Cache initialized, sweeping every {:?}",
        settings.search.sweep_interval()
    );

    // Providers are registered at login
    let aggregator = Arc::new(
        Aggregator::new(cache)
            .with_timeout(settings.search.timeout())
            .with_cache_ttl(settings.search.cache_ttl()),
    );
    info!(
        "Aggregator ready (timeout {:?}, cache TTL {:?}), no providers until login",
        aggregator.timeout(),
        aggregator.cache_ttl()
    );

    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    let app = create_router(AppState::new(settings, aggregator, client));

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
Fare Aggregator v{}
Aggregates flight price quotes from multiple providers

USAGE:
    fare-aggregator [-h | --help]

ENDPOINTS:
    POST /login              Authenticate and register providers
    GET  /flights/search     Ranked quotes (origin, destination, startDate, endDate)
    GET  /flights/history    Monthly average prices (origin, destination)
    GET  /sse/:route         Streamed updates for ORIGIN|DEST|START[|END]
    GET  /health, /stats

ENVIRONMENT VARIABLES:
    FARE_SETTINGS_PATH          Path to settings.yml
    FARE_DEBUG                  Enable debug logging (true/false)
    FARE_PORT                   Server port
    FARE_BIND_ADDRESS           Bind address
    FARE_JWT_SECRET             Token signing secret
    FARE_AMADEUS_CLIENT_ID      Amadeus client id
    FARE_AMADEUS_CLIENT_SECRET  Amadeus client secret
    FARE_SERPAPI_KEY            SerpAPI key for Google Flights
    RUST_LOG                    Log filter, overrides FARE_DEBUG
"#,
        fare_aggregator::VERSION
    );
}
