//! Dashboard: stats over all cases plus the filtered case list

use axum::{
    extract::{Query, State},
    Json,
};
use cmon_common::dashboard::{compute_stats, filter_cases, order_counts, DashboardStats, OrderCounts, StatusFilter};
use cmon_common::{db, time, Case};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::identity::UserId;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Query parameters for GET /api/dashboard
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Free-text search over case number, parties and court
    #[serde(default)]
    pub q: String,
    /// all | urgent | pending | completed
    pub status: Option<String>,
}

/// One case card
#[derive(Debug, Serialize)]
pub struct CaseCard {
    #[serde(flatten)]
    pub case: Case,
    pub order_counts: OrderCounts,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Computed over every case, not just the filtered ones
    pub stats: DashboardStats,
    pub status_filter: StatusFilter,
    pub cases: Vec<CaseCard>,
}

/// GET /api/dashboard?q=&status=
pub async fn get_dashboard(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardResponse>> {
    let status_filter = match query.status.as_deref() {
        None | Some("") => StatusFilter::All,
        Some(raw) => raw
            .parse::<StatusFilter>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    };

    let cases = db::list_cases_for_user(&state.db, user_id, time::now()).await?;
    let stats = compute_stats(&cases);
    let filtered = filter_cases(&cases, &query.q, status_filter);

    debug!(
        "Dashboard for {}: {} of {} cases match q='{}' status={}",
        user_id,
        filtered.len(),
        cases.len(),
        query.q,
        status_filter
    );

    let cards = filtered
        .into_iter()
        .map(|case| CaseCard {
            order_counts: order_counts(&case.orders),
            case,
        })
        .collect();

    Ok(Json(DashboardResponse {
        stats,
        status_filter,
        cases: cards,
    }))
}
