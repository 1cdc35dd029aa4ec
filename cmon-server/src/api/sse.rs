//! Server-Sent Events for change notification
//!
//! Replaces dashboard polling: clients re-fetch the view named by each event
//! instead of overwriting local state on a timer.

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use super::identity::UserId;
use crate::AppState;

/// GET /api/events - the caller's change events plus heartbeat
pub async fn event_stream(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    cmon_common::sse::create_user_event_stream("cmon-server", &state.event_bus, user_id)
}
