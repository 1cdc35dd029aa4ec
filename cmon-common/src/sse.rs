//! Server-Sent Events (SSE) utilities
//!
//! Pushes [`CaseEvent`]s to one signed-in user. Each SSE frame carries the
//! event name (`CaseCreated`, `OrderUpdated`, ...) and the JSON-serialized
//! event as data. Clients treat any frame as "re-fetch the affected view".

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::{CaseEvent, EventBus};

/// Heartbeat interval for idle connections
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Convert an event into an SSE frame
pub fn to_sse_event(event: &CaseEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(json) => Event::default().event(event.event_type()).data(json),
        Err(e) => {
            warn!("SSE: failed to serialize {}: {}", event.event_type(), e);
            Event::default().comment("serialization error")
        }
    }
}

/// Create an SSE stream of the events owned by `user_id`
///
/// Emits a `ConnectionStatus` frame first. When the subscriber falls behind
/// the bus capacity, a `Resync` frame tells the client to reload everything.
pub fn create_user_event_stream(
    service_name: &'static str,
    event_bus: &EventBus,
    user_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = event_bus.subscribe();
    info!(
        "New SSE client connected to {} events (user {}, {} listening)",
        service_name,
        user_id,
        event_bus.subscriber_count()
    );

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if event.user_id() != user_id {
                        continue;
                    }
                    debug!("SSE: sending {} to user {}", event.event_type(), user_id);
                    yield Ok(to_sse_event(&event));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: user {} lagged, skipped {} events", user_id, skipped);
                    yield Ok(Event::default().event("Resync").data(skipped.to_string()));
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}
