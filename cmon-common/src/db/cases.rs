//! Court case persistence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::orders::{attach_order, load_orders_for_case, load_orders_for_user, prepare_order};
use super::{date_text, parse_date, parse_optional_date, parse_timestamp, timestamp_text};
use crate::dashboard::refresh_urgency;
use crate::models::{Case, NewCase, NewOrder, Order, Urgency};
use crate::uuid_utils::{self, parse_column};
use crate::{Error, Result};

const CASE_COLUMNS: &str = "id, user_id, case_number, petitioner, respondent, court_name, \
     case_type, case_summary, filing_date, latest_order_date, next_hearing_date, urgency, \
     created_at, updated_at";

/// Map a row to a case with no orders attached
fn case_from_row(row: &SqliteRow) -> Result<Case> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let latest_order_date: String = row.try_get("latest_order_date")?;
    let urgency: String = row.try_get("urgency")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Case {
        id: parse_column("id", &id)?,
        user_id: parse_column("user_id", &user_id)?,
        case_number: row.try_get("case_number")?,
        petitioner: row.try_get("petitioner")?,
        respondent: row.try_get("respondent")?,
        court_name: row.try_get("court_name")?,
        case_type: row.try_get("case_type")?,
        case_summary: row.try_get("case_summary")?,
        filing_date: parse_optional_date("filing_date", row.try_get("filing_date")?)?,
        latest_order_date: parse_date("latest_order_date", &latest_order_date)?,
        next_hearing_date: parse_optional_date(
            "next_hearing_date",
            row.try_get("next_hearing_date")?,
        )?,
        urgency: urgency
            .parse::<Urgency>()
            .map_err(|e| Error::Internal(format!("corrupt urgency: {}", e)))?,
        orders: Vec::new(),
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

pub(crate) async fn insert_case_row(conn: &mut SqliteConnection, case: &Case) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO court_cases (
            id, user_id, case_number, petitioner, respondent, court_name, case_type,
            case_summary, filing_date, latest_order_date, next_hearing_date, urgency,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(case.id.to_string())
    .bind(case.user_id.to_string())
    .bind(&case.case_number)
    .bind(&case.petitioner)
    .bind(&case.respondent)
    .bind(&case.court_name)
    .bind(&case.case_type)
    .bind(&case.case_summary)
    .bind(date_text(case.filing_date))
    .bind(case.latest_order_date.to_string())
    .bind(date_text(case.next_hearing_date))
    .bind(case.urgency.as_str())
    .bind(timestamp_text(case.created_at))
    .bind(timestamp_text(case.updated_at))
    .execute(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict(format!("case {} already exists", case.case_number))
        }
        other => Error::from(other),
    })?;

    Ok(())
}

/// NotFound unless the case exists and belongs to `user_id`
pub(crate) async fn ensure_case_owned(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    case_id: Uuid,
) -> Result<()> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT id FROM court_cases WHERE id = ? AND user_id = ?")
            .bind(case_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

    found
        .map(|_| ())
        .ok_or_else(|| Error::NotFound(format!("case {}", case_id)))
}

/// All of the user's cases, newest first, with orders and live urgency
pub async fn list_cases_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<Case>> {
    let sql = format!(
        "SELECT {} FROM court_cases WHERE user_id = ? ORDER BY created_at DESC",
        CASE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_all(pool)
        .await?;

    let mut cases = rows.iter().map(case_from_row).collect::<Result<Vec<_>>>()?;

    let mut orders_by_case: HashMap<Uuid, Vec<Order>> = HashMap::new();
    for order in load_orders_for_user(pool, user_id).await? {
        orders_by_case.entry(order.case_id).or_default().push(order);
    }
    for case in &mut cases {
        case.orders = orders_by_case.remove(&case.id).unwrap_or_default();
    }

    refresh_urgency(&mut cases, now);
    Ok(cases)
}

/// One of the user's cases with orders and live urgency
pub async fn get_case(
    pool: &SqlitePool,
    user_id: Uuid,
    case_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Case> {
    let mut conn = pool.acquire().await?;

    let sql = format!(
        "SELECT {} FROM court_cases WHERE id = ? AND user_id = ?",
        CASE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(case_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("case {}", case_id)))?;

    let mut case = case_from_row(&row)?;
    case.orders = load_orders_for_case(&mut conn, case.id).await?;
    refresh_urgency(std::slice::from_mut(&mut case), now);

    Ok(case)
}

fn prepare_case(user_id: Uuid, new_case: &NewCase, now: DateTime<Utc>) -> Case {
    Case {
        id: uuid_utils::generate(),
        user_id,
        case_number: new_case.case_number.trim().to_string(),
        petitioner: new_case.petitioner.trim().to_string(),
        respondent: new_case.respondent.trim().to_string(),
        court_name: new_case.court_name.trim().to_string(),
        case_type: new_case.case_type.clone(),
        case_summary: new_case.case_summary.clone(),
        filing_date: new_case.filing_date,
        latest_order_date: new_case.latest_order_date.unwrap_or_else(|| now.date_naive()),
        next_hearing_date: new_case.next_hearing_date,
        urgency: Urgency::Normal,
        orders: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

/// Create an empty case; `latest_order_date` defaults to today
///
/// [`Error::Conflict`] if the user already has a case with this number.
pub async fn create_case(
    pool: &SqlitePool,
    user_id: Uuid,
    new_case: &NewCase,
    now: DateTime<Utc>,
) -> Result<Case> {
    new_case.validate()?;
    let case = prepare_case(user_id, new_case, now);

    let mut conn = pool.acquire().await?;
    insert_case_row(&mut conn, &case).await?;

    info!("Created case {} ({})", case.case_number, case.id);
    Ok(case)
}

/// Create a case together with its first order, all or nothing
///
/// Both inputs are validated before anything is written, so a rejected
/// order never leaves an orphan case behind.
pub async fn create_case_with_order(
    pool: &SqlitePool,
    user_id: Uuid,
    new_case: &NewCase,
    new_order: Option<&NewOrder>,
    now: DateTime<Utc>,
) -> Result<(Case, Option<Order>)> {
    new_case.validate()?;
    if let Some(new_order) = new_order {
        new_order.validate()?;
    }

    let mut case = prepare_case(user_id, new_case, now);
    let order = new_order.map(|o| prepare_order(user_id, case.id, o, now));

    let mut tx = pool.begin().await?;
    insert_case_row(&mut tx, &case).await?;
    if let Some(order) = &order {
        attach_order(&mut tx, order, now).await?;
    }
    tx.commit().await?;

    if let Some(order) = &order {
        case.latest_order_date = case.latest_order_date.max(order.order_date);
        case.orders.push(order.clone());
        refresh_urgency(std::slice::from_mut(&mut case), now);
    }

    info!(
        "Created case {} ({}) with {} order(s)",
        case.case_number,
        case.id,
        case.orders.len()
    );
    Ok((case, order))
}

/// Delete a case; its orders go with it (ON DELETE CASCADE)
pub async fn delete_case(pool: &SqlitePool, user_id: Uuid, case_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM court_cases WHERE id = ? AND user_id = ?")
        .bind(case_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("case {}", case_id)));
    }

    info!("Deleted case {}", case_id);
    Ok(())
}

/// Most recently created case of the user with this (trimmed) case number
pub async fn find_case_by_number(
    pool: &SqlitePool,
    user_id: Uuid,
    case_number: &str,
    now: DateTime<Utc>,
) -> Result<Option<Case>> {
    let found: Option<String> = sqlx::query_scalar(
        r#"
        SELECT id FROM court_cases
        WHERE user_id = ? AND TRIM(case_number) = ?
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id.to_string())
    .bind(case_number.trim())
    .fetch_optional(pool)
    .await?;

    let Some(id) = found else {
        debug!("No case numbered '{}' for user {}", case_number, user_id);
        return Ok(None);
    };

    let case_id = parse_column("id", &id)?;
    get_case(pool, user_id, case_id, now).await.map(Some)
}
