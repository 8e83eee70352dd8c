//! Server-sent event stream re-running a search on a fixed period

use super::state::AppState;
use crate::results::AggregatedResult;
use crate::search::{Aggregator, SearchQuery};
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, BoxStream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, warn};

type EventStream = BoxStream<'static, Result<Event, Infallible>>;

/// Stream `update` events for `ORIGIN|DEST|START[|END]`.
///
/// The first search runs immediately, then once per poll interval until the
/// client disconnects. A malformed route yields one `error` event.
pub async fn stream(State(state): State<AppState>, Path(route): Path<String>) -> Sse<EventStream> {
    let query = match SearchQuery::from_route(&route) {
        Ok(query) => query,
        Err(e) => {
            warn!("Rejected stream route {:?}: {}", route, e);
            let event = error_event(e.to_string());
            return Sse::new(stream::once(async move { Ok(event) }).boxed());
        }
    };

    let mut ticker = interval(state.settings.search.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!("Opening stream for {}", query.route());

    Sse::new(updates(state.aggregator.clone(), query, ticker)).keep_alive(KeepAlive::default())
}

fn updates(aggregator: Arc<Aggregator>, query: SearchQuery, ticker: Interval) -> EventStream {
    stream::unfold(
        (aggregator, query, ticker),
        |(aggregator, query, mut ticker)| async move {
            ticker.tick().await;
            let event = match aggregator.search(&query).await {
                Ok(result) => update_event(&result),
                Err(e) => error_event(e.to_string()),
            };
            Some((Ok(event), (aggregator, query, ticker)))
        },
    )
    .boxed()
}

fn update_event(result: &AggregatedResult) -> Event {
    Event::default()
        .event("update")
        .json_data(result)
        .unwrap_or_else(|e| error_event(e.to_string()))
}

fn error_event(message: String) -> Event {
    Event::default().event("error").data(message)
}
