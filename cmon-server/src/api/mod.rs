//! HTTP API handlers for cmon-server

pub mod cases;
pub mod dashboard;
pub mod health;
pub mod identity;
pub mod ingest;
pub mod orders;
pub mod profile;
pub mod sse;
pub mod uploads;

pub use cases::{add_order, create_case, delete_case, get_case};
pub use dashboard::get_dashboard;
pub use health::health_routes;
pub use identity::UserId;
pub use ingest::ingest;
pub use orders::{delete_order, update_order_status};
pub use profile::{get_profile, update_profile};
pub use sse::event_stream;
pub use uploads::upload_documents;
