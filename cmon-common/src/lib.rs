//! # Court Monitor Common Library
//!
//! Shared code for the Court Monitor service including:
//! - Case, order and profile models
//! - Urgency and status transition rules
//! - Dashboard statistics and case filtering
//! - Database schema and queries
//! - Change events for server push
//! - Configuration loading

pub mod config;
pub mod dashboard;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod rules;
pub mod sse;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use models::{Case, Order, OrderStatus, Profile, Urgency};
