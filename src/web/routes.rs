//! Route definitions

use super::state::AppState;
use super::{auth, handlers, sse};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes behind a bearer token
    let protected = Router::new()
        .route("/flights/search", get(handlers::search))
        .route("/flights/history", get(handlers::history))
        .route("/sse/:route", get(sse::stream))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_jwt,
        ));

    Router::new()
        .route("/login", post(handlers::login))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::config::Settings;
    use crate::network::HttpClient;
    use crate::results::AggregatedResult;
    use crate::search::Aggregator;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use futures::StreamExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<Aggregator>) {
        let mut settings = Settings::default();
        settings.providers.mock.min_latency_ms = 0;
        settings.providers.mock.max_latency_ms = 0;

        let cache: Arc<TtlCache<Arc<AggregatedResult>>> = Arc::new(TtlCache::new());
        let aggregator = Arc::new(Aggregator::new(cache));
        let state = AppState::new(settings, aggregator.clone(), HttpClient::new().unwrap());
        (create_router(state), aggregator)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router, user: &str, pass: &str) -> axum::response::Response {
        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "user": user, "pass": pass }).to_string()))
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn token(app: &Router) -> String {
        let response = login(app, "admin", "secret").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["jwt_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn authed(uri: &str, token: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_search_requires_token() {
        let (app, _) = app();
        let uri = "/flights/search?origin=GRU&destination=JFK&startDate=2025-12-01";

        let missing = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let forged = app.oneshot(authed(uri, "not-a-jwt")).await.unwrap();
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let (app, aggregator) = app();
        let response = login(&app, "admin", "wrong").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(aggregator.provider_names().is_empty());
    }

    #[tokio::test]
    async fn test_login_registers_providers_once() {
        let (app, aggregator) = app();
        token(&app).await;
        let response = login(&app, "admin", "secret").await;

        let body = body_json(response).await;
        assert_eq!(body["providers"], json!(["Ports Airlines"]));
        assert_eq!(body["expires_in"], 3600);
        assert_eq!(aggregator.provider_names(), vec!["Ports Airlines"]);
    }

    #[tokio::test]
    async fn test_search_after_login() {
        let (app, _) = app();
        let token = token(&app).await;

        let response = app
            .oneshot(authed(
                "/flights/search?origin=gru&destination=JFK&startDate=2025-12-01&endDate=2025-12-08",
                &token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["offers"].as_array().unwrap().len(), 1);
        assert_eq!(body["cheapest"]["provider"], "Ports Airlines");
        assert_eq!(body["cheapest"]["origin"], "GRU");
    }

    #[tokio::test]
    async fn test_search_errors() {
        let (app, aggregator) = app();
        let token = token(&app).await;

        let invalid = app
            .clone()
            .oneshot(authed(
                "/flights/search?origin=GRUU&destination=JFK&startDate=2025-12-01",
                &token,
            ))
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        aggregator.remove_provider("Ports Airlines");
        let no_offers = app
            .oneshot(authed(
                "/flights/search?origin=GRU&destination=JFK&startDate=2025-12-01",
                &token,
            ))
            .await
            .unwrap();
        assert_eq!(no_offers.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_history() {
        let (app, _) = app();
        let token = token(&app).await;

        let response = app
            .clone()
            .oneshot(authed("/flights/history?origin=GRU&destination=JFK", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["history"].as_array().unwrap().len(), 24);
        assert_eq!(body["history"][0]["avgPrice"], "700");

        let missing = app
            .oneshot(authed("/flights/history?origin=GRU", &token))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stream_rejects_malformed_route() {
        let (app, _) = app();
        let token = token(&app).await;

        let response = app.oneshot(authed("/sse/GRU", &token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("event: error"));
    }

    #[tokio::test]
    async fn test_stream_first_update_is_immediate() {
        let (app, _) = app();
        let token = token(&app).await;

        let response = app
            .oneshot(authed("/sse/GRU%7CJFK%7C2025-12-01", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        let text = String::from_utf8(first.to_vec()).unwrap();
        assert!(text.contains("event: update"));
        assert!(text.contains("Ports Airlines"));
    }
}
