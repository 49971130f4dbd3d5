//! Server-Sent Events for session updates

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events
///
/// Streams every `CoachEvent`: step state changes, assignment and step count
/// changes, sequence imports, aggregate and release results.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    bb_common::sse::create_event_sse_stream("bb-coach", &state.event_bus)
}
