//! Court order persistence
//!
//! Every write that can change a case's nearest pending deadline (insert,
//! status change, extraction write-back, delete) recomputes the case's
//! stored urgency inside the same transaction.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::cases::ensure_case_owned;
use super::{date_text, parse_date, parse_optional_date, parse_timestamp, timestamp_text};
use crate::models::{NewOrder, Order, OrderExtraction, OrderStatus, Urgency};
use crate::rules::transition::{apply_plan, TransitionPlan};
use crate::rules::urgency;
use crate::uuid_utils::{self, parse_column};
use crate::{Error, Result};

pub(crate) const ORDER_COLUMNS: &str = "id, case_id, user_id, order_date, uploaded_at, \
     file_name, file_url, file_type, court_order_file_name, court_order_file_url, \
     case_status_file_name, case_status_file_url, thumbnail_url, deadline, summary, \
     action_required, status, completion_date, completion_document_url, extracted_data, \
     updated_at";

pub(crate) fn order_from_row(row: &SqliteRow) -> Result<Order> {
    let id: String = row.try_get("id")?;
    let case_id: String = row.try_get("case_id")?;
    let user_id: String = row.try_get("user_id")?;
    let order_date: String = row.try_get("order_date")?;
    let uploaded_at: String = row.try_get("uploaded_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let status: String = row.try_get("status")?;
    let extracted_data: Option<String> = row.try_get("extracted_data")?;

    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| Error::Internal(format!("corrupt status: {}", e)))?;
    let extracted_data = extracted_data
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| Error::Internal(format!("corrupt extracted_data: {}", e)))?;

    Ok(Order {
        id: parse_column("id", &id)?,
        case_id: parse_column("case_id", &case_id)?,
        user_id: parse_column("user_id", &user_id)?,
        order_date: parse_date("order_date", &order_date)?,
        uploaded_at: parse_timestamp("uploaded_at", &uploaded_at)?,
        file_name: row.try_get("file_name")?,
        file_url: row.try_get("file_url")?,
        file_type: row.try_get("file_type")?,
        court_order_file_name: row.try_get("court_order_file_name")?,
        court_order_file_url: row.try_get("court_order_file_url")?,
        case_status_file_name: row.try_get("case_status_file_name")?,
        case_status_file_url: row.try_get("case_status_file_url")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        deadline: parse_optional_date("deadline", row.try_get("deadline")?)?,
        summary: row.try_get("summary")?,
        action_required: row.try_get("action_required")?,
        status,
        completion_date: parse_optional_date("completion_date", row.try_get("completion_date")?)?,
        completion_document_url: row.try_get("completion_document_url")?,
        extracted_data,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

fn extracted_data_text(value: &Option<serde_json::Value>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| Error::Internal(format!("serialize extracted_data: {}", e)))
}

pub(crate) async fn insert_order_row(conn: &mut SqliteConnection, order: &Order) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO court_orders (
            id, case_id, user_id, order_date, uploaded_at, file_name, file_url, file_type,
            court_order_file_name, court_order_file_url, case_status_file_name,
            case_status_file_url, thumbnail_url, deadline, summary, action_required,
            status, completion_date, completion_document_url, extracted_data, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(order.id.to_string())
    .bind(order.case_id.to_string())
    .bind(order.user_id.to_string())
    .bind(order.order_date.to_string())
    .bind(timestamp_text(order.uploaded_at))
    .bind(&order.file_name)
    .bind(&order.file_url)
    .bind(&order.file_type)
    .bind(&order.court_order_file_name)
    .bind(&order.court_order_file_url)
    .bind(&order.case_status_file_name)
    .bind(&order.case_status_file_url)
    .bind(&order.thumbnail_url)
    .bind(date_text(order.deadline))
    .bind(&order.summary)
    .bind(&order.action_required)
    .bind(order.status.as_str())
    .bind(date_text(order.completion_date))
    .bind(&order.completion_document_url)
    .bind(extracted_data_text(&order.extracted_data)?)
    .bind(timestamp_text(order.updated_at))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn load_orders_for_case(
    conn: &mut SqliteConnection,
    case_id: Uuid,
) -> Result<Vec<Order>> {
    let sql = format!(
        "SELECT {} FROM court_orders WHERE case_id = ? ORDER BY uploaded_at",
        ORDER_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(case_id.to_string())
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(order_from_row).collect()
}

pub(crate) async fn load_orders_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Order>> {
    let sql = format!(
        "SELECT {} FROM court_orders WHERE user_id = ? ORDER BY uploaded_at",
        ORDER_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(order_from_row).collect()
}

/// Recompute and store the urgency column of one case
pub(crate) async fn refresh_case_urgency(
    conn: &mut SqliteConnection,
    case_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Urgency> {
    let orders = load_orders_for_case(&mut *conn, case_id).await?;
    let tier = urgency::classify(&orders, now);

    sqlx::query("UPDATE court_cases SET urgency = ? WHERE id = ?")
        .bind(tier.as_str())
        .bind(case_id.to_string())
        .execute(&mut *conn)
        .await?;

    debug!("Case {} urgency refreshed to {}", case_id, tier);
    Ok(tier)
}

async fn fetch_order(conn: &mut SqliteConnection, user_id: Uuid, order_id: Uuid) -> Result<Order> {
    let sql = format!(
        "SELECT {} FROM court_orders WHERE id = ? AND user_id = ?",
        ORDER_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(order_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("order {}", order_id)))?;

    order_from_row(&row)
}

/// Row for a validated new order, not yet written
pub(crate) fn prepare_order(
    user_id: Uuid,
    case_id: Uuid,
    new_order: &NewOrder,
    now: DateTime<Utc>,
) -> Order {
    Order {
        id: uuid_utils::generate(),
        case_id,
        user_id,
        order_date: new_order.order_date,
        uploaded_at: now,
        file_name: new_order.file_name.trim().to_string(),
        file_url: new_order.file_url.clone(),
        file_type: new_order.file_type.clone(),
        court_order_file_name: new_order.court_order_file_name.clone(),
        court_order_file_url: new_order.court_order_file_url.clone(),
        case_status_file_name: new_order.case_status_file_name.clone(),
        case_status_file_url: new_order.case_status_file_url.clone(),
        thumbnail_url: new_order.thumbnail_url.clone(),
        deadline: new_order.deadline,
        summary: new_order.summary.clone(),
        action_required: new_order.action_required.clone(),
        status: new_order.status,
        completion_date: new_order.completion_date,
        completion_document_url: new_order
            .completion_document_url
            .clone()
            .filter(|url| !url.trim().is_empty()),
        extracted_data: new_order.extracted_data.clone(),
        updated_at: now,
    }
}

/// Write an order row and bring its case's `latest_order_date` and urgency
/// up to date, on the caller's connection or transaction
pub(crate) async fn attach_order(
    conn: &mut SqliteConnection,
    order: &Order,
    now: DateTime<Utc>,
) -> Result<()> {
    insert_order_row(&mut *conn, order).await?;

    sqlx::query(
        r#"
        UPDATE court_cases
        SET latest_order_date = MAX(latest_order_date, ?), updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(order.order_date.to_string())
    .bind(timestamp_text(now))
    .bind(order.case_id.to_string())
    .execute(&mut *conn)
    .await?;

    refresh_case_urgency(&mut *conn, order.case_id, now).await?;
    Ok(())
}

/// Attach a new order to one of the user's cases
///
/// Moves the case's `latest_order_date` forward (never backward) and
/// refreshes its stored urgency.
pub async fn insert_order(
    pool: &SqlitePool,
    user_id: Uuid,
    case_id: Uuid,
    new_order: &NewOrder,
    now: DateTime<Utc>,
) -> Result<Order> {
    new_order.validate()?;
    let order = prepare_order(user_id, case_id, new_order, now);

    let mut tx = pool.begin().await?;
    ensure_case_owned(&mut tx, user_id, case_id).await?;
    attach_order(&mut tx, &order, now).await?;
    tx.commit().await?;

    debug!("Inserted order {} into case {}", order.id, case_id);
    Ok(order)
}

/// Load one of the user's orders
pub async fn get_order(pool: &SqlitePool, user_id: Uuid, order_id: Uuid) -> Result<Order> {
    let mut conn = pool.acquire().await?;
    fetch_order(&mut conn, user_id, order_id).await
}

/// Persist a status change that already passed the transition gate
///
/// Leaving `completed` writes the retained completion fields back unchanged.
/// Concurrent updates are last-write-wins; `updated_at` records the winner.
pub async fn update_order_status(
    pool: &SqlitePool,
    user_id: Uuid,
    order_id: Uuid,
    plan: &TransitionPlan,
    now: DateTime<Utc>,
) -> Result<Order> {
    let mut tx = pool.begin().await?;
    let mut order = fetch_order(&mut tx, user_id, order_id).await?;

    apply_plan(&mut order, plan);
    order.updated_at = now;

    sqlx::query(
        r#"
        UPDATE court_orders
        SET status = ?, completion_date = ?, completion_document_url = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(order.status.as_str())
    .bind(date_text(order.completion_date))
    .bind(&order.completion_document_url)
    .bind(timestamp_text(now))
    .bind(order.id.to_string())
    .execute(&mut *tx)
    .await?;

    refresh_case_urgency(&mut tx, order.case_id, now).await?;
    tx.commit().await?;

    Ok(order)
}

/// Delete one of the user's orders, returning the removed row
pub async fn delete_order(
    pool: &SqlitePool,
    user_id: Uuid,
    order_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Order> {
    let mut tx = pool.begin().await?;
    let order = fetch_order(&mut tx, user_id, order_id).await?;

    sqlx::query("DELETE FROM court_orders WHERE id = ?")
        .bind(order_id.to_string())
        .execute(&mut *tx)
        .await?;

    refresh_case_urgency(&mut tx, order.case_id, now).await?;
    tx.commit().await?;

    Ok(order)
}

/// Store extraction results; `None` fields keep their current value
pub async fn update_extraction(
    pool: &SqlitePool,
    user_id: Uuid,
    order_id: Uuid,
    extraction: &OrderExtraction,
    now: DateTime<Utc>,
) -> Result<Order> {
    let mut tx = pool.begin().await?;
    let existing = fetch_order(&mut tx, user_id, order_id).await?;

    sqlx::query(
        r#"
        UPDATE court_orders
        SET summary = COALESCE(?, summary),
            action_required = COALESCE(?, action_required),
            deadline = COALESCE(?, deadline),
            thumbnail_url = COALESCE(?, thumbnail_url),
            extracted_data = COALESCE(?, extracted_data),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&extraction.summary)
    .bind(&extraction.action_required)
    .bind(date_text(extraction.deadline))
    .bind(&extraction.thumbnail_url)
    .bind(extracted_data_text(&extraction.extracted_data)?)
    .bind(timestamp_text(now))
    .bind(order_id.to_string())
    .execute(&mut *tx)
    .await?;

    refresh_case_urgency(&mut tx, existing.case_id, now).await?;
    let updated = fetch_order(&mut tx, user_id, order_id).await?;
    tx.commit().await?;

    Ok(updated)
}
