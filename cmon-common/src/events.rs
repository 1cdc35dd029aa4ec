//! Change events for server push
//!
//! Every successful mutation emits a [`CaseEvent`]. Connected dashboards
//! receive them over SSE and re-fetch the affected view, instead of a blind
//! fixed-interval poll that can clobber a newer local edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::OrderStatus;

/// Data change notification, always scoped to the owning user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CaseEvent {
    CaseCreated {
        user_id: Uuid,
        case_id: Uuid,
        case_number: String,
        timestamp: DateTime<Utc>,
    },

    /// Case and all of its orders were removed
    CaseDeleted {
        user_id: Uuid,
        case_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// New order attached (user upload or relay write-back)
    OrderAdded {
        user_id: Uuid,
        case_id: Uuid,
        order_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Status change or extraction write-back
    OrderUpdated {
        user_id: Uuid,
        case_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
        timestamp: DateTime<Utc>,
    },

    OrderDeleted {
        user_id: Uuid,
        case_id: Uuid,
        order_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    ProfileUpdated {
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl CaseEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            CaseEvent::CaseCreated { .. } => "CaseCreated",
            CaseEvent::CaseDeleted { .. } => "CaseDeleted",
            CaseEvent::OrderAdded { .. } => "OrderAdded",
            CaseEvent::OrderUpdated { .. } => "OrderUpdated",
            CaseEvent::OrderDeleted { .. } => "OrderDeleted",
            CaseEvent::ProfileUpdated { .. } => "ProfileUpdated",
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            CaseEvent::CaseCreated { user_id, .. }
            | CaseEvent::CaseDeleted { user_id, .. }
            | CaseEvent::OrderAdded { user_id, .. }
            | CaseEvent::OrderUpdated { user_id, .. }
            | CaseEvent::OrderDeleted { user_id, .. }
            | CaseEvent::ProfileUpdated { user_id, .. } => *user_id,
        }
    }
}

/// Broadcast channel for [`CaseEvent`]s
///
/// Non-blocking publish; slow subscribers lag and skip rather than block
/// request handlers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CaseEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CaseEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Returns the number of subscribers reached.
    pub fn emit_lossy(&self, event: CaseEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
