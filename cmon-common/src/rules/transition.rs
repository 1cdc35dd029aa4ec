//! Order status transition gate
//!
//! Any status may move to any other status. The single rule: entering
//! `completed` requires a completion date (the completion document is
//! optional). Leaving `completed` keeps the completion fields as they were;
//! callers must not assume they are cleared.
//!
//! The gate runs synchronously before the persistence write and knows
//! nothing about storage.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ValidationError;
use crate::models::{Order, OrderStatus};

/// Requested status change for one order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub completion_date: Option<NaiveDate>,
    pub completion_document_url: Option<String>,
}

impl StatusChange {
    pub fn to(status: OrderStatus) -> Self {
        Self {
            status,
            completion_date: None,
            completion_document_url: None,
        }
    }

    pub fn complete(completion_date: NaiveDate, document_url: Option<String>) -> Self {
        Self {
            status: OrderStatus::Completed,
            completion_date: Some(completion_date),
            completion_document_url: document_url,
        }
    }
}

/// Column values to write once a change has passed the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Write only the status; completion fields are left untouched
    Status(OrderStatus),
    /// Write `completed` together with both completion fields
    Complete {
        completion_date: NaiveDate,
        completion_document_url: Option<String>,
    },
}

impl TransitionPlan {
    pub fn status(&self) -> OrderStatus {
        match self {
            TransitionPlan::Status(status) => *status,
            TransitionPlan::Complete { .. } => OrderStatus::Completed,
        }
    }
}

/// Validate a change without touching any order
pub fn check(change: StatusChange) -> Result<TransitionPlan, ValidationError> {
    match change.status {
        OrderStatus::Completed => {
            let completion_date = change
                .completion_date
                .ok_or(ValidationError::MissingCompletionDate)?;
            Ok(TransitionPlan::Complete {
                completion_date,
                completion_document_url: change
                    .completion_document_url
                    .filter(|url| !url.trim().is_empty()),
            })
        }
        status @ (OrderStatus::Pending | OrderStatus::InProgress) => {
            Ok(TransitionPlan::Status(status))
        }
    }
}

/// Apply a checked plan to an in-memory order
pub fn apply_plan(order: &mut Order, plan: &TransitionPlan) {
    match plan {
        TransitionPlan::Status(status) => order.status = *status,
        TransitionPlan::Complete {
            completion_date,
            completion_document_url,
        } => {
            order.status = OrderStatus::Completed;
            order.completion_date = Some(*completion_date);
            order.completion_document_url = completion_document_url.clone();
        }
    }
}

/// Gate and apply in one step; the order is unchanged on error
pub fn transition(order: &mut Order, change: StatusChange) -> Result<TransitionPlan, ValidationError> {
    let plan = check(change)?;
    apply_plan(order, &plan);
    Ok(plan)
}
