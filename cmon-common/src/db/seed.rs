//! Demo data for a fresh account

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::cases::insert_case_row;
use super::orders::insert_order_row;
use crate::models::{Case, Order, OrderStatus, Urgency};
use crate::uuid_utils;
use crate::{Error, Result};

const DEMO_COURT: &str = "High Court of Allahabad";

struct DemoCase {
    case_number: &'static str,
    petitioner: &'static str,
    respondent: &'static str,
    case_type: Option<&'static str>,
    case_summary: Option<&'static str>,
    filing_date: &'static str,
    latest_order_date: &'static str,
    next_hearing_date: Option<&'static str>,
    urgency: Urgency,
    orders: &'static [DemoOrder],
}

struct DemoOrder {
    order_date: &'static str,
    file_name: &'static str,
    deadline: Option<&'static str>,
    summary: Option<&'static str>,
    action_required: Option<&'static str>,
    status: OrderStatus,
    completion_date: Option<&'static str>,
}

const DEMO_CASES: &[DemoCase] = &[
    DemoCase {
        case_number: "PIL/2243/2025",
        petitioner: "Arvind Kumar",
        respondent: "State of U.P. and Others",
        case_type: Some("PIL"),
        case_summary: Some("Petitioner seeks action on land demarcation in Rampur Ganj village"),
        filing_date: "2025-07-25",
        latest_order_date: "2025-08-12",
        next_hearing_date: Some("2025-08-19"),
        urgency: Urgency::Urgent,
        orders: &[
            DemoOrder {
                order_date: "2025-07-25",
                file_name: "PIL_2243_status.pdf",
                deadline: Some("2025-08-15"),
                summary: None,
                action_required: Some("File counter affidavit"),
                status: OrderStatus::Pending,
                completion_date: None,
            },
            DemoOrder {
                order_date: "2025-08-12",
                file_name: "PIL_2243_order.pdf",
                deadline: Some("2025-08-15"),
                summary: None,
                action_required: Some("Submit demarcation map"),
                status: OrderStatus::InProgress,
                completion_date: None,
            },
        ],
    },
    DemoCase {
        case_number: "PIL/2208/2025",
        petitioner: "Ramesh Sharma",
        respondent: "District Collector and Others",
        case_type: None,
        case_summary: None,
        filing_date: "2025-06-15",
        latest_order_date: "2025-07-20",
        next_hearing_date: Some("2025-09-10"),
        urgency: Urgency::Normal,
        orders: &[DemoOrder {
            order_date: "2025-07-20",
            file_name: "PIL_2208_status.pdf",
            deadline: None,
            summary: None,
            action_required: Some("None"),
            status: OrderStatus::Completed,
            completion_date: Some("2025-07-20"),
        }],
    },
    DemoCase {
        case_number: "WP/1170/2025",
        petitioner: "Sita Devi",
        respondent: "Tehsildar and Others",
        case_type: None,
        case_summary: None,
        filing_date: "2025-05-10",
        latest_order_date: "2025-08-05",
        next_hearing_date: Some("2025-08-25"),
        urgency: Urgency::Warning,
        orders: &[DemoOrder {
            order_date: "2025-08-05",
            file_name: "WP_1170_order.pdf",
            deadline: Some("2025-08-20"),
            summary: None,
            action_required: Some("Land record verification report"),
            status: OrderStatus::InProgress,
            completion_date: None,
        }],
    },
    DemoCase {
        case_number: "PIL/2210/2025",
        petitioner: "Mukesh Yadav",
        respondent: "State of U.P.",
        case_type: None,
        case_summary: None,
        filing_date: "2025-07-01",
        latest_order_date: "2025-07-28",
        next_hearing_date: Some("2025-08-30"),
        urgency: Urgency::Urgent,
        orders: &[DemoOrder {
            order_date: "2025-07-28",
            file_name: "PIL_2210_order.pdf",
            deadline: Some("2025-08-18"),
            summary: None,
            action_required: Some("Submit compensation calculation"),
            status: OrderStatus::Pending,
            completion_date: None,
        }],
    },
    DemoCase {
        case_number: "WP/1102/2024",
        petitioner: "Rajesh Kumar",
        respondent: "Revenue Department",
        case_type: None,
        case_summary: None,
        filing_date: "2024-12-15",
        latest_order_date: "2025-01-20",
        next_hearing_date: None,
        urgency: Urgency::Normal,
        orders: &[DemoOrder {
            order_date: "2025-01-20",
            file_name: "WP_1102_final_order.pdf",
            deadline: None,
            summary: Some("Case disposed. Land record correction ordered and completed."),
            action_required: None,
            status: OrderStatus::Completed,
            completion_date: Some("2025-01-20"),
        }],
    },
];

fn demo_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::Internal(format!("bad demo date '{}': {}", value, e)))
}

fn demo_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value.map(demo_date).transpose()
}

fn build_order(demo: &DemoOrder, case_id: Uuid, user_id: Uuid, at: DateTime<Utc>) -> Result<Order> {
    Ok(Order {
        id: uuid_utils::generate(),
        case_id,
        user_id,
        order_date: demo_date(demo.order_date)?,
        uploaded_at: at,
        file_name: demo.file_name.to_string(),
        file_url: format!("/docs/{}", demo.file_name),
        file_type: "application/pdf".to_string(),
        court_order_file_name: None,
        court_order_file_url: None,
        case_status_file_name: None,
        case_status_file_url: None,
        thumbnail_url: None,
        deadline: demo_optional_date(demo.deadline)?,
        summary: demo.summary.map(str::to_string),
        action_required: demo.action_required.map(str::to_string),
        status: demo.status,
        completion_date: demo_optional_date(demo.completion_date)?,
        completion_document_url: None,
        extracted_data: None,
        updated_at: at,
    })
}

/// Replace the user's cases with the demo set; returns the number of cases
///
/// The stored urgency column is written as given; readers still derive the
/// live tier from the deadlines.
pub async fn seed_demo_data(pool: &SqlitePool, user_id: Uuid, now: DateTime<Utc>) -> Result<usize> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM court_cases WHERE user_id = ?")
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

    for (index, demo) in DEMO_CASES.iter().enumerate() {
        // Earlier entries are listed first (newest created)
        let created_at = now - Duration::seconds(index as i64);
        let case_id = uuid_utils::generate();

        let case = Case {
            id: case_id,
            user_id,
            case_number: demo.case_number.to_string(),
            petitioner: demo.petitioner.to_string(),
            respondent: demo.respondent.to_string(),
            court_name: DEMO_COURT.to_string(),
            case_type: demo.case_type.map(str::to_string),
            case_summary: demo.case_summary.map(str::to_string),
            filing_date: Some(demo_date(demo.filing_date)?),
            latest_order_date: demo_date(demo.latest_order_date)?,
            next_hearing_date: demo_optional_date(demo.next_hearing_date)?,
            urgency: demo.urgency,
            orders: Vec::new(),
            created_at,
            updated_at: created_at,
        };
        insert_case_row(&mut tx, &case).await?;

        for (order_index, demo_order) in demo.orders.iter().enumerate() {
            let uploaded_at = created_at + Duration::milliseconds(order_index as i64);
            let order = build_order(demo_order, case_id, user_id, uploaded_at)?;
            insert_order_row(&mut tx, &order).await?;
        }
    }

    tx.commit().await?;

    info!("Seeded {} demo cases for user {}", DEMO_CASES.len(), user_id);
    Ok(DEMO_CASES.len())
}
