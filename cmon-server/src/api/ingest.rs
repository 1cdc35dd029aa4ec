//! Extraction write-back from the automation service
//!
//! The automation service posts one payload per processed document. The case
//! is matched by number (created when unknown); the order is either a new
//! row or, when `order_id` is given, an update of extraction fields on an
//! existing one, whose case then wins over `case_number`. Null summary,
//! action or deadline are accepted as-is. A new case and its first order
//! are written in one transaction.

use axum::{extract::State, Json};
use chrono::NaiveDate;
use cmon_common::events::CaseEvent;
use cmon_common::models::{NewCase, NewOrder, OrderExtraction};
use cmon_common::{db, time};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestPayload {
    /// Owner the uploaded document belongs to (forwarded as `userId`)
    pub user_id: Uuid,
    pub case_number: String,
    #[serde(default)]
    pub petitioner: String,
    #[serde(default)]
    pub respondent: String,
    #[serde(default)]
    pub court_name: String,
    pub case_type: Option<String>,
    pub case_summary: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub next_hearing_date: Option<NaiveDate>,
    /// New order extracted from the document
    pub order: Option<NewOrder>,
    /// Existing order to update instead of inserting
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub extraction: OrderExtraction,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub case_id: Uuid,
    pub case_created: bool,
    pub order_id: Option<Uuid>,
}

/// POST /api/ingest
pub async fn ingest(
    State(state): State<AppState>,
    Json(payload): Json<IngestPayload>,
) -> ApiResult<Json<IngestResponse>> {
    if payload.order.is_some() && payload.order_id.is_some() {
        return Err(ApiError::BadRequest(
            "send either order or order_id, not both".to_string(),
        ));
    }

    let now = time::now();
    let user_id = payload.user_id;

    // Updating an existing order: its case is authoritative
    if let Some(order_id) = payload.order_id {
        let order =
            db::update_extraction(&state.db, user_id, order_id, &payload.extraction, now).await?;
        state.event_bus.emit_lossy(CaseEvent::OrderUpdated {
            user_id,
            case_id: order.case_id,
            order_id: order.id,
            status: order.status,
            timestamp: now,
        });
        info!("Updated extraction of order {} for user {}", order_id, user_id);
        return Ok(Json(IngestResponse {
            case_id: order.case_id,
            case_created: false,
            order_id: Some(order.id),
        }));
    }

    if payload.order.is_none() && !payload.extraction.is_empty() {
        return Err(ApiError::BadRequest(
            "extraction needs an order or order_id to attach to".to_string(),
        ));
    }

    let new_order = payload.order.clone().map(|mut order| {
        order.merge_extraction(&payload.extraction);
        order
    });
    // Reject before touching the case so a bad order leaves nothing behind
    if let Some(order) = &new_order {
        order.validate().map_err(cmon_common::Error::from)?;
    }

    let existing = db::find_case_by_number(&state.db, user_id, &payload.case_number, now).await?;
    let (case, case_created, order) = match existing {
        Some(case) => {
            let order = match &new_order {
                Some(o) => Some(db::insert_order(&state.db, user_id, case.id, o, now).await?),
                None => None,
            };
            (case, false, order)
        }
        None => {
            let new_case = NewCase {
                case_number: payload.case_number.clone(),
                petitioner: payload.petitioner.clone(),
                respondent: payload.respondent.clone(),
                court_name: payload.court_name.clone(),
                case_type: payload.case_type.clone(),
                case_summary: payload.case_summary.clone(),
                filing_date: payload.filing_date,
                latest_order_date: new_order.as_ref().map(|o| o.order_date),
                next_hearing_date: payload.next_hearing_date,
            };
            let (case, order) =
                db::create_case_with_order(&state.db, user_id, &new_case, new_order.as_ref(), now)
                    .await?;
            state.event_bus.emit_lossy(CaseEvent::CaseCreated {
                user_id,
                case_id: case.id,
                case_number: case.case_number.clone(),
                timestamp: now,
            });
            (case, true, order)
        }
    };

    let order_id = order.map(|order| {
        state.event_bus.emit_lossy(CaseEvent::OrderAdded {
            user_id,
            case_id: case.id,
            order_id: order.id,
            timestamp: now,
        });
        order.id
    });

    info!(
        "Ingested case {} for user {} (created: {}, order: {:?})",
        case.case_number, user_id, case_created, order_id
    );

    Ok(Json(IngestResponse {
        case_id: case.id,
        case_created,
        order_id,
    }))
}
