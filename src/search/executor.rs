//! Search execution and orchestration

use super::models::SearchQuery;
use crate::cache::Cache;
use crate::metrics::Metrics;
use crate::providers::{Provider, ProviderError, ProviderRegistry, RegistryError};
use crate::results::{AggregatedResult, ProviderFailure, Quote, QuoteContainer};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Cache type the aggregator memoizes results in
pub type ResultCache = dyn Cache<Arc<AggregatedResult>>;

/// Search failure surfaced to callers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// Every provider failed, timed out or returned nothing
    #[error("no valid offers from {queried} provider(s)")]
    NoOffers { queried: usize },
}

/// How one provider call ended
#[derive(Debug)]
enum CallOutcome {
    Quotes(Vec<Quote>),
    Failed(ProviderError),
    /// Still running at the deadline; its future was dropped
    Cancelled,
}

#[derive(Debug)]
struct ProviderCall {
    outcome: CallOutcome,
    elapsed: Duration,
}

/// Spawned tasks that are aborted if the group is dropped before joining
struct TaskGroup<T> {
    handles: Vec<JoinHandle<T>>,
}

impl<T: Send + 'static> TaskGroup<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            handles: Vec::with_capacity(capacity),
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.handles.push(tokio::spawn(task));
    }

    /// Wait for every task, in spawn order
    async fn join(&mut self) -> Vec<Result<T, JoinError>> {
        join_all(self.handles.iter_mut()).await
    }
}

impl<T> Drop for TaskGroup<T> {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Fan-out coordinator: dispatches a query to every registered provider
/// under one deadline, ranks the merged quotes and memoizes the result.
pub struct Aggregator {
    /// Active providers
    registry: ProviderRegistry,
    /// Short-lived result cache
    cache: Arc<ResultCache>,
    /// Budget for one search, shared by all providers
    timeout: Duration,
    /// How long an aggregated result is served from cache
    cache_ttl: Duration,
    metrics: Arc<Metrics>,
}

impl Aggregator {
    /// Create an aggregator with an empty registry
    pub fn new(cache: Arc<ResultCache>) -> Self {
        Self {
            registry: ProviderRegistry::new(),
            cache,
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
            cache_ttl: Duration::from_secs(crate::DEFAULT_CACHE_TTL),
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Set the per-search timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long results stay cached
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Share a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Register a provider. Fails if the name is already taken.
    pub fn add_provider(&self, provider: Arc<dyn Provider>) -> Result<(), RegistryError> {
        let name = provider.name().to_string();
        self.registry.add(provider)?;
        info!("Provider {} added", name);
        Ok(())
    }

    /// Register a provider, swapping out any provider with the same name
    pub fn replace_provider(&self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        if self.registry.replace(provider).is_some() {
            info!("Provider {} replaced", name);
        } else {
            info!("Provider {} added", name);
        }
    }

    /// Unregister the first provider called `name`. Returns whether one was removed.
    pub fn remove_provider(&self, name: &str) -> bool {
        let removed = self.registry.remove(name).is_some();
        if removed {
            info!("Provider {} removed", name);
        }
        removed
    }

    /// Names of the active providers
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Search every provider and return the ranked, cached aggregate.
    ///
    /// Provider failures are absorbed; only the absence of any usable quote
    /// is an error. Identical queries within the cache TTL are answered
    /// without contacting providers.
    pub async fn search(
        &self,
        query: &SearchQuery,
    ) -> Result<Arc<AggregatedResult>, AggregationError> {
        self.metrics.inc_search();
        let key = query.cache_key();

        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            self.metrics.record_cache_hit();
            return Ok(cached);
        }
        debug!("Cache miss for {}", key);
        self.metrics.record_cache_miss();

        let deadline = Instant::now() + self.timeout;

        // The registry lock is released here, before any provider runs
        let providers = self.registry.snapshot();
        let queried = providers.len();
        info!("Searching {} on {} providers", query.route(), queried);

        let names: Vec<String> = providers.iter().map(|p| p.name().to_string()).collect();
        let shared_query = Arc::new(query.clone());
        let mut tasks = TaskGroup::with_capacity(queried);
        for provider in providers {
            let query = shared_query.clone();
            tasks.spawn(async move { call_provider(provider, &query, deadline).await });
        }

        let mut container = QuoteContainer::new();
        for (name, joined) in names.into_iter().zip(tasks.join().await) {
            self.collect(&mut container, name, joined);
        }

        info!(
            "Collected {} quotes from {} of {} providers for {}",
            container.quote_count(),
            container.contributors().len(),
            queried,
            query.route()
        );

        let result = Arc::new(
            container
                .into_result()
                .ok_or(AggregationError::NoOffers { queried })?,
        );

        self.cache.set(key.clone(), result.clone(), self.cache_ttl);
        debug!("Cached result for {} ({:?})", key, self.cache_ttl);

        Ok(result)
    }

    fn collect(
        &self,
        container: &mut QuoteContainer,
        name: String,
        joined: Result<ProviderCall, JoinError>,
    ) {
        let call = match joined {
            Ok(call) => call,
            Err(e) => {
                warn!("Provider {} task failed: {}", name, e);
                self.metrics.record_error(&name, 0);
                container.add_unresponsive(name, ProviderFailure::Crashed(e.to_string()));
                return;
            }
        };

        let elapsed_ms = call.elapsed.as_millis() as u64;
        match call.outcome {
            CallOutcome::Quotes(quotes) => {
                debug!(
                    "Provider {} returned {} quotes in {:?}",
                    name,
                    quotes.len(),
                    call.elapsed
                );
                self.metrics.record_success(&name, elapsed_ms);
                container.add_quotes(&name, quotes);
            }
            CallOutcome::Failed(e) => {
                warn!("Provider {} failed: {}", name, e);
                self.metrics.record_error(&name, elapsed_ms);
                container.add_unresponsive(name, ProviderFailure::Error(e.to_string()));
            }
            CallOutcome::Cancelled => {
                warn!("Provider {} timed out", name);
                self.metrics.record_timeout(&name);
                container.add_unresponsive(name, ProviderFailure::Timeout);
            }
        }
    }
}

/// Run one provider call, dropping it if the shared deadline fires first
async fn call_provider(
    provider: Arc<dyn Provider>,
    query: &SearchQuery,
    deadline: Instant,
) -> ProviderCall {
    let start = Instant::now();
    let outcome = match timeout_at(deadline, provider.search(query)).await {
        Ok(Ok(quotes)) => CallOutcome::Quotes(quotes),
        Ok(Err(e)) => CallOutcome::Failed(e),
        Err(_) => CallOutcome::Cancelled,
    };

    ProviderCall {
        outcome,
        elapsed: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::providers::ProviderResult;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn query() -> SearchQuery {
        SearchQuery::new(
            "GRU",
            "JFK",
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 8).unwrap(),
        )
        .unwrap()
    }

    fn cache() -> Arc<TtlCache<Arc<AggregatedResult>>> {
        Arc::new(TtlCache::new())
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(cache()).with_timeout(Duration::from_secs(1))
    }

    struct PanickingProvider;

    #[async_trait]
    impl Provider for PanickingProvider {
        fn name(&self) -> &str {
            "panicky"
        }

        async fn search(&self, _query: &SearchQuery) -> ProviderResult<Vec<Quote>> {
            panic!("upstream parser bug");
        }
    }

    struct FixedProvider;

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, query: &SearchQuery) -> ProviderResult<Vec<Quote>> {
            Ok(vec![Quote::builder(self.name())
                .price(Decimal::from(250))
                .route(query.origin(), query.destination())
                .duration(Duration::from_secs(3600))
                .build()?])
        }
    }

    /// Sleeps, then records that it finished
    struct SlowProvider {
        finished: Arc<AtomicBool>,
        started: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Provider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn search(&self, _query: &SearchQuery) -> ProviderResult<Vec<Quote>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_panicking_provider_is_isolated() {
        let aggregator = aggregator();
        aggregator.add_provider(Arc::new(PanickingProvider)).unwrap();
        aggregator.add_provider(Arc::new(FixedProvider)).unwrap();

        let result = aggregator.search(&query()).await.unwrap();
        assert_eq!(result.offers().len(), 1);
        assert_eq!(result.unresponsive()[0].name, "panicky");
        assert!(matches!(
            result.unresponsive()[0].failure,
            ProviderFailure::Crashed(_)
        ));
    }

    #[tokio::test]
    async fn test_no_providers_is_no_offers() {
        let err = aggregator().search(&query()).await.unwrap_err();
        assert_eq!(err, AggregationError::NoOffers { queried: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_provider_is_cancelled() {
        let finished = Arc::new(AtomicBool::new(false));
        let started = Arc::new(AtomicUsize::new(0));
        let aggregator = aggregator();
        aggregator
            .add_provider(Arc::new(SlowProvider {
                finished: finished.clone(),
                started: started.clone(),
            }))
            .unwrap();
        aggregator.add_provider(Arc::new(FixedProvider)).unwrap();

        let result = aggregator.search(&query()).await.unwrap();
        assert_eq!(result.unresponsive()[0].failure, ProviderFailure::Timeout);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert!(!finished.load(Ordering::SeqCst), "late call must be dropped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_search_aborts_provider_tasks() {
        let finished = Arc::new(AtomicBool::new(false));
        let started = Arc::new(AtomicUsize::new(0));
        let aggregator = Aggregator::new(cache()).with_timeout(Duration::from_secs(120));
        aggregator
            .add_provider(Arc::new(SlowProvider {
                finished: finished.clone(),
                started: started.clone(),
            }))
            .unwrap();

        let query = query();
        let abandoned = tokio::time::timeout(Duration::from_secs(1), aggregator.search(&query)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_metrics_recorded() {
        let aggregator = aggregator();
        aggregator.add_provider(Arc::new(FixedProvider)).unwrap();

        aggregator.search(&query()).await.unwrap();
        aggregator.search(&query()).await.unwrap();

        let snapshot = aggregator.metrics().snapshot();
        assert_eq!(snapshot.total_searches, 2);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.providers["fixed"].successes, 1);
    }

    #[tokio::test]
    async fn test_replace_provider_does_not_duplicate() {
        let aggregator = aggregator();
        aggregator.replace_provider(Arc::new(FixedProvider));
        aggregator.replace_provider(Arc::new(FixedProvider));
        assert_eq!(aggregator.provider_names(), vec!["fixed"]);

        assert!(aggregator.add_provider(Arc::new(FixedProvider)).is_err());
        assert!(aggregator.remove_provider("fixed"));
        assert!(!aggregator.remove_provider("fixed"));
    }
}
