//! Case endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cmon_common::dashboard::sorted_orders;
use cmon_common::events::CaseEvent;
use cmon_common::models::{NewCase, NewOrder};
use cmon_common::{db, time, Case, Order};
use tracing::info;
use uuid::Uuid;

use super::identity::UserId;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/cases/:id
///
/// Orders come back newest first for the timeline.
pub async fn get_case(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(case_id): Path<Uuid>,
) -> ApiResult<Json<Case>> {
    let mut case = db::get_case(&state.db, user_id, case_id, time::now()).await?;
    case.orders = sorted_orders(&case.orders);
    Ok(Json(case))
}

/// POST /api/cases
///
/// 409 if the user already tracks a case with this number.
pub async fn create_case(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(new_case): Json<NewCase>,
) -> ApiResult<(StatusCode, Json<Case>)> {
    new_case.validate().map_err(cmon_common::Error::from)?;

    // The unique (user, number) index turns a duplicate into a 409
    let now = time::now();
    let case = db::create_case(&state.db, user_id, &new_case, now).await?;

    state.event_bus.emit_lossy(CaseEvent::CaseCreated {
        user_id,
        case_id: case.id,
        case_number: case.case_number.clone(),
        timestamp: now,
    });

    Ok((StatusCode::CREATED, Json(case)))
}

/// DELETE /api/cases/:id (orders are removed with it)
pub async fn delete_case(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(case_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    db::delete_case(&state.db, user_id, case_id).await?;

    state.event_bus.emit_lossy(CaseEvent::CaseDeleted {
        user_id,
        case_id,
        timestamp: time::now(),
    });

    info!("User {} deleted case {}", user_id, case_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/cases/:id/orders
pub async fn add_order(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(case_id): Path<Uuid>,
    Json(new_order): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let now = time::now();
    let order = db::insert_order(&state.db, user_id, case_id, &new_order, now).await?;

    state.event_bus.emit_lossy(CaseEvent::OrderAdded {
        user_id,
        case_id,
        order_id: order.id,
        timestamp: now,
    });

    Ok((StatusCode::CREATED, Json(order)))
}
