//! HTTP request handlers

use super::auth::issue_token;
use super::error::AppError;
use super::state::AppState;
use crate::metrics::MetricsSnapshot;
use crate::providers::ProviderLoader;
use crate::search::SearchQuery;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Months of synthetic price history served by `/flights/history`
const HISTORY_MONTHS: u32 = 24;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub jwt_token: String,
    pub expires_in: u64,
    pub providers: Vec<String>,
}

/// Query parameters for flight search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub origin: String,
    pub destination: String,
    #[serde(rename = "startDate")]
    pub start_date: String,
    /// Defaults to the start date
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub origin: String,
    pub destination: String,
    pub history: Vec<MonthlyPrice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPrice {
    /// `YYYY-MM`
    pub month: String,
    #[serde(rename = "avgPrice")]
    pub avg_price: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub instance_name: String,
    pub providers: Vec<String>,
    pub metrics: MetricsSnapshot,
}

/// Check credentials, register the configured providers and issue a token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let auth = &state.settings.auth;
    if body.user != auth.username || body.pass != auth.password {
        warn!("Rejected login for {}", body.user);
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let providers = ProviderLoader::load_for_login(&state.settings, &state.client).await?;
    let names: Vec<String> = providers.iter().map(|p| p.name().to_string()).collect();
    for provider in providers {
        state.aggregator.replace_provider(provider);
    }

    let jwt_token = issue_token(auth, &body.user).map_err(|e| {
        error!("Token signing failed: {}", e);
        AppError::internal("jwt error")
    })?;

    info!("User {} logged in, {} providers active", body.user, names.len());
    Ok(Json(LoginResponse {
        jwt_token,
        expires_in: auth.token_ttl_secs,
        providers: names,
    }))
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let query = SearchQuery::parse(
        &params.origin,
        &params.destination,
        &params.start_date,
        params.end_date.as_deref(),
    )?;

    let result = state.aggregator.search(&query).await?;
    Ok(Json(&*result).into_response())
}

/// Synthetic monthly average prices for a route
pub async fn history(Query(params): Query<HistoryParams>) -> Result<Json<HistoryResponse>, AppError> {
    let (origin, destination) = match (params.origin, params.destination) {
        (Some(o), Some(d)) if !o.trim().is_empty() && !d.trim().is_empty() => (o, d),
        _ => return Err(AppError::bad_request("origin and destination required")),
    };

    Ok(Json(HistoryResponse {
        origin,
        destination,
        history: price_history(Utc::now().date_naive()),
    }))
}

fn price_history(today: NaiveDate) -> Vec<MonthlyPrice> {
    let first_of_month = today.with_day(1).unwrap_or(today);
    (0..HISTORY_MONTHS)
        .filter_map(|i| {
            let month = first_of_month.checked_sub_months(Months::new(i))?;
            Some(MonthlyPrice {
                month: month.format("%Y-%m").to_string(),
                avg_price: Decimal::from(700 + i * 10 + (i % 3) * 15),
                currency: "USD".to_string(),
            })
        })
        .collect()
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// Registered providers and aggregation counters
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        instance_name: state.instance_name().to_string(),
        providers: state.aggregator.provider_names(),
        metrics: state.aggregator.metrics().snapshot(),
    })
}
