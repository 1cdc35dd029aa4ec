//! cmon-server library - Court Monitor HTTP service
//!
//! JSON API over the case/order store, upload relay to the automation
//! webhook, extraction write-back, and SSE change notifications.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use cmon_common::events::EventBus;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod relay;

use relay::{RelayClient, MAX_FILE_BYTES};

/// Broadcast capacity for change events
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Change notifications for connected dashboards
    pub event_bus: EventBus,
    /// Ingestion relay; uploads are refused when absent
    pub relay: Option<RelayClient>,
}

impl AppState {
    /// Create new application state without an ingestion relay
    pub fn new(db: SqlitePool, event_bus: EventBus) -> Self {
        Self {
            db,
            event_bus,
            relay: None,
        }
    }

    pub fn with_relay(mut self, relay: Option<RelayClient>) -> Self {
        self.relay = relay;
        self
    }
}

/// Build application router
///
/// `/health` and `/api/ingest` take no caller identity; every other route
/// requires `X-User-Id`.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    // Two files per bundle plus form fields
    let upload_limit = 2 * MAX_FILE_BYTES + 64 * 1024;

    let user_routes = Router::new()
        .route("/api/dashboard", get(api::get_dashboard))
        .route("/api/cases", post(api::create_case))
        .route("/api/cases/:id", get(api::get_case).delete(api::delete_case))
        .route("/api/cases/:id/orders", post(api::add_order))
        .route("/api/orders/:id/status", put(api::update_order_status))
        .route("/api/orders/:id", axum::routing::delete(api::delete_order))
        .route(
            "/api/uploads",
            post(api::upload_documents).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/profile", get(api::get_profile).put(api::update_profile))
        .route("/api/events", get(api::event_stream));

    let service_routes = Router::new()
        .route("/api/ingest", post(api::ingest))
        .merge(api::health_routes());

    Router::new()
        .merge(user_routes)
        .merge(service_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
