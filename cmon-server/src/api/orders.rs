//! Order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cmon_common::events::CaseEvent;
use cmon_common::rules::transition;
use cmon_common::rules::StatusChange;
use cmon_common::{db, time, Order};
use tracing::info;
use uuid::Uuid;

use super::identity::UserId;
use crate::error::ApiResult;
use crate::AppState;

/// PUT /api/orders/:id/status
///
/// Body: `{"status", "completion_date"?, "completion_document_url"?}`.
/// Completing without a completion date is rejected with 400 before any write.
pub async fn update_order_status(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(order_id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<Order>> {
    let plan = transition::check(change).map_err(cmon_common::Error::from)?;

    let now = time::now();
    let order = db::update_order_status(&state.db, user_id, order_id, &plan, now).await?;

    state.event_bus.emit_lossy(CaseEvent::OrderUpdated {
        user_id,
        case_id: order.case_id,
        order_id: order.id,
        status: order.status,
        timestamp: now,
    });

    info!("Order {} marked {}", order.id, order.status.label());
    Ok(Json(order))
}

/// DELETE /api/orders/:id
pub async fn delete_order(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(order_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let now = time::now();
    let order = db::delete_order(&state.db, user_id, order_id, now).await?;

    state.event_bus.emit_lossy(CaseEvent::OrderDeleted {
        user_id,
        case_id: order.case_id,
        order_id: order.id,
        timestamp: now,
    });

    Ok(StatusCode::NO_CONTENT)
}
