//! Bearer-token authentication

use super::error::AppError;
use super::state::AppState;
use crate::config::AuthSettings;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user
    pub sub: String,
    /// Expiry, seconds since the epoch
    pub exp: u64,
    /// Issued at, seconds since the epoch
    pub iat: u64,
}

/// Sign an HS256 token for `subject` valid for `auth.token_ttl_secs`
pub fn issue_token(auth: &AuthSettings, subject: &str) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now().timestamp().max(0) as u64;
    let claims = Claims {
        sub: subject.to_string(),
        iat: now,
        exp: now + auth.token_ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
}

/// Check signature and expiry
pub fn verify_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// Middleware rejecting requests without a valid bearer token.
///
/// The decoded [`Claims`] are stored in the request extensions.
pub async fn require_jwt(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("missing bearer"))?;

    let claims = verify_token(&state.settings.auth.jwt_secret, token).map_err(|e| {
        debug!("Rejected token: {}", e);
        AppError::unauthorized("invalid token")
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
