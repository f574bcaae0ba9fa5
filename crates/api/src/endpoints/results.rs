//! Ranked results endpoints, including the SSE live stream.
//!
//! Both endpoints require the poll's admin token; a missing poll and a
//! wrong token produce the same response.

use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream, StreamExt};
use schedpoll_common::AppError;
use schedpoll_core::services::RankedResult;
use serde::Deserialize;

use crate::{response::ApiResponse, state::AppState};

#[derive(Debug, Deserialize)]
struct AdminQuery {
    admin: String,
}

fn results_event(result: &RankedResult) -> Event {
    Event::default()
        .event("results")
        .json_data(result)
        .unwrap_or_else(|_| Event::default().event("results").data("{}"))
}

/// Current ranked tally for a poll.
async fn get_results(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    Query(query): Query<AdminQuery>,
) -> Result<ApiResponse<RankedResult>, AppError> {
    state.gate.authorize(&poll_id, &query.admin).await?;
    let result = state.results.current(&poll_id).await?;
    Ok(ApiResponse::ok(result))
}

/// Live ranked tally as an SSE stream of `results` events.
///
/// The first event carries the current tally; later events follow vote
/// mutations on the poll. Intermediate states may be skipped, the last
/// event always reflects the latest stored votes.
async fn stream_results(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    Query(query): Query<AdminQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state.gate.authorize(&poll_id, &query.admin).await?;
    let subscription = state.results.subscribe(&poll_id).await?;

    let initial = stream::once({
        let snapshot = subscription.latest();
        async move { Ok(results_event(&snapshot)) }
    });

    let updates = stream::unfold(subscription, |mut subscription| async move {
        let result = subscription.next().await?;
        Some((Ok(results_event(&result)), subscription))
    });

    Ok(Sse::new(initial.chain(updates)).keep_alive(KeepAlive::default()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{poll_id}/results", get(get_results))
        .route("/{poll_id}/results/stream", get(stream_results))
}
