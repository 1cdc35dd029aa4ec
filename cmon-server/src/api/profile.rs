//! Profile endpoints

use axum::{extract::State, Json};
use cmon_common::events::CaseEvent;
use cmon_common::models::ProfileUpdate;
use cmon_common::{db, time, Profile};

use super::identity::UserId;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/profile (created empty on first access)
pub async fn get_profile(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<Profile>> {
    let profile = db::get_or_create_profile(&state.db, user_id, time::now()).await?;
    Ok(Json(profile))
}

/// PUT /api/profile
///
/// `practice_areas` is the comma-separated form value; blank fields clear.
pub async fn update_profile(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    let now = time::now();
    let profile = db::upsert_profile(&state.db, user_id, &update, now).await?;

    state.event_bus.emit_lossy(CaseEvent::ProfileUpdated {
        user_id,
        timestamp: now,
    });

    Ok(Json(profile))
}
