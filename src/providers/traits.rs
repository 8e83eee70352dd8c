//! Provider traits and types

use crate::results::{Quote, QuoteError};
use crate::search::SearchQuery;
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single provider call
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request could not be sent or the connection failed
    #[error("request failed: {0}")]
    Request(String),
    /// Upstream answered with a non-2xx status
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// Response body was not in the expected shape
    #[error("decode failed: {0}")]
    Decode(String),
    /// Response parsed but yielded no usable quotes
    #[error("no valid quotes for {0}")]
    NoQuotes(String),
    /// Credential exchange failed
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Upstream data violated a quote invariant
    #[error(transparent)]
    InvalidQuote(#[from] QuoteError),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// A source of quotes.
///
/// Implemented once per upstream vendor and by the synthetic
/// [`MockProvider`](super::MockProvider).
///
/// Cancellation is signalled by dropping the future returned from
/// [`search`](Provider::search): the aggregator drops every call still
/// pending when its deadline fires, so implementations must not detach
/// work that outlives the future.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier used for attribution, logging and removal
    fn name(&self) -> &str;

    /// Fetch quotes for `query`. Zero quotes is a valid, non-error outcome.
    async fn search(&self, query: &SearchQuery) -> ProviderResult<Vec<Quote>>;
}
