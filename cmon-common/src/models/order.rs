//! Court order record

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderStatus;
use crate::error::ValidationError;

/// A single uploaded court document plus its extracted metadata
///
/// `summary`, `action_required` and `deadline` are filled in asynchronously by
/// the ingestion relay and may stay `None` until a later write-back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub case_id: Uuid,
    pub user_id: Uuid,
    pub order_date: NaiveDate,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub court_order_file_name: Option<String>,
    pub court_order_file_url: Option<String>,
    pub case_status_file_name: Option<String>,
    pub case_status_file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub summary: Option<String>,
    pub action_required: Option<String>,
    pub status: OrderStatus,
    /// Only meaningful when `status == Completed`; retained when leaving it
    pub completion_date: Option<NaiveDate>,
    pub completion_document_url: Option<String>,
    pub extracted_data: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

fn default_file_type() -> String {
    "application/pdf".to_string()
}

/// Fields supplied when an order is attached to a case
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub order_date: NaiveDate,
    pub file_name: String,
    #[serde(default)]
    pub file_url: String,
    #[serde(default = "default_file_type")]
    pub file_type: String,
    pub court_order_file_name: Option<String>,
    pub court_order_file_url: Option<String>,
    pub case_status_file_name: Option<String>,
    pub case_status_file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub summary: Option<String>,
    pub action_required: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    pub completion_date: Option<NaiveDate>,
    pub completion_document_url: Option<String>,
    pub extracted_data: Option<serde_json::Value>,
}

impl NewOrder {
    /// Minimal order for a freshly uploaded document awaiting extraction
    pub fn uploaded(order_date: NaiveDate, file_name: impl Into<String>, file_url: impl Into<String>) -> Self {
        Self {
            order_date,
            file_name: file_name.into(),
            file_url: file_url.into(),
            file_type: default_file_type(),
            court_order_file_name: None,
            court_order_file_url: None,
            case_status_file_name: None,
            case_status_file_url: None,
            thumbnail_url: None,
            deadline: None,
            summary: None,
            action_required: None,
            status: OrderStatus::Pending,
            completion_date: None,
            completion_document_url: None,
            extracted_data: None,
        }
    }

    /// Fill fields the uploader left empty from an extraction result
    ///
    /// Values already on the order win.
    pub fn merge_extraction(&mut self, extraction: &OrderExtraction) {
        fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(value);
            }
        }
        fill(&mut self.summary, &extraction.summary);
        fill(&mut self.action_required, &extraction.action_required);
        fill(&mut self.deadline, &extraction.deadline);
        fill(&mut self.thumbnail_url, &extraction.thumbnail_url);
        fill(&mut self.extracted_data, &extraction.extracted_data);
    }

    /// Orders created already completed go through the same gate as updates
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.file_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("file_name"));
        }
        if self.status.is_completed() && self.completion_date.is_none() {
            return Err(ValidationError::MissingCompletionDate);
        }
        Ok(())
    }
}

/// Metadata written back by the ingestion relay once extraction finishes
///
/// `None` leaves the stored value as it was, so a partial write-back never
/// erases earlier results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrderExtraction {
    pub summary: Option<String>,
    pub action_required: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub thumbnail_url: Option<String>,
    pub extracted_data: Option<serde_json::Value>,
}

impl OrderExtraction {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.action_required.is_none()
            && self.deadline.is_none()
            && self.thumbnail_url.is_none()
            && self.extracted_data.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_extraction_keeps_existing_values() {
        let mut order = NewOrder::uploaded(date(2025, 8, 5), "WP_1170_order.pdf", "");
        order.summary = Some("Uploader note".to_string());
        let extraction = OrderExtraction {
            summary: Some("Extracted summary".to_string()),
            deadline: Some(date(2025, 8, 20)),
            ..OrderExtraction::default()
        };

        order.merge_extraction(&extraction);

        assert_eq!(order.summary.as_deref(), Some("Uploader note"));
        assert_eq!(order.deadline, Some(date(2025, 8, 20)));
        assert!(order.action_required.is_none());
    }

    #[test]
    fn test_extraction_tolerates_nulls() {
        let extraction: OrderExtraction = serde_json::from_str(
            r#"{"summary": null, "action_required": "File reply", "deadline": null}"#,
        )
        .unwrap();
        assert!(extraction.summary.is_none());
        assert_eq!(extraction.action_required.as_deref(), Some("File reply"));
        assert!(!extraction.is_empty());
        assert!(OrderExtraction::default().is_empty());
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_order_defaults() {
        let order: NewOrder = serde_json::from_str(
            r#"{"order_date": "2025-08-12", "file_name": "PIL_2243_order.pdf"}"#,
        )
        .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.file_type, "application/pdf");
        assert!(order.summary.is_none());
        assert!(order.deadline.is_none());
    }

    #[test]
    fn test_completed_new_order_needs_completion_date() {
        let mut order = NewOrder::uploaded(date(2025, 7, 20), "PIL_2208_status.pdf", "/docs/x.pdf");
        order.status = OrderStatus::Completed;
        assert_eq!(order.validate(), Err(ValidationError::MissingCompletionDate));

        order.completion_date = Some(date(2025, 7, 20));
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_new_order_requires_file_name() {
        let order = NewOrder::uploaded(date(2025, 7, 20), "", "");
        assert_eq!(order.validate(), Err(ValidationError::EmptyField("file_name")));
    }
}
