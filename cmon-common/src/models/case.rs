//! Court case record

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Order, Urgency};
use crate::error::ValidationError;

/// A legal proceeding grouping one or more orders
///
/// `urgency` is a derived view. Readers recompute it from `orders` with
/// [`crate::rules::urgency::classify`]; the persisted column is only a copy
/// for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Free-text, jurisdiction-specific (e.g. "Writ A: 2024/567", "PIL/2243/2025")
    pub case_number: String,
    pub petitioner: String,
    pub respondent: String,
    pub court_name: String,
    pub case_type: Option<String>,
    pub case_summary: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub latest_order_date: NaiveDate,
    pub next_hearing_date: Option<NaiveDate>,
    pub urgency: Urgency,
    /// Insertion order is irrelevant; consumers re-sort by date
    pub orders: Vec<Order>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a user creates a case directly
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCase {
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
    pub latest_order_date: Option<NaiveDate>,
    pub next_hearing_date: Option<NaiveDate>,
}

impl NewCase {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.case_number.trim().is_empty() {
            return Err(ValidationError::EmptyField("case_number"));
        }
        Ok(())
    }
}
