//! Profile persistence (one row per user, created lazily)

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use super::{parse_timestamp, timestamp_text};
use crate::models::{non_blank, parse_practice_areas, Profile, ProfileUpdate};
use crate::uuid_utils::{self, parse_column};
use crate::{Error, Result};

fn profile_from_row(row: &SqliteRow) -> Result<Profile> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let practice_areas: String = row.try_get("practice_areas")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Profile {
        id: parse_column("id", &id)?,
        user_id: parse_column("user_id", &user_id)?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        firm_name: row.try_get("firm_name")?,
        bar_registration: row.try_get("bar_registration")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip_code: row.try_get("zip_code")?,
        practice_areas: serde_json::from_str(&practice_areas)
            .map_err(|e| Error::Internal(format!("corrupt practice_areas: {}", e)))?,
        avatar_url: row.try_get("avatar_url")?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

/// Load the user's profile, if one exists
pub async fn get_profile(pool: &SqlitePool, user_id: Uuid) -> Result<Option<Profile>> {
    let row = sqlx::query("SELECT * FROM profiles WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(profile_from_row).transpose()
}

/// Load the user's profile, inserting an empty one on first access
pub async fn get_or_create_profile(
    pool: &SqlitePool,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Profile> {
    let inserted = sqlx::query(
        r#"
        INSERT OR IGNORE INTO profiles (id, user_id, practice_areas, created_at, updated_at)
        VALUES (?, ?, '[]', ?, ?)
        "#,
    )
    .bind(uuid_utils::generate().to_string())
    .bind(user_id.to_string())
    .bind(timestamp_text(now))
    .bind(timestamp_text(now))
    .execute(pool)
    .await?;

    if inserted.rows_affected() > 0 {
        info!("Created profile for user {}", user_id);
    }

    get_profile(pool, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("profile for user {}", user_id)))
}

/// Replace the user's profile fields from a form submission
///
/// Blank fields are stored as NULL; `avatar_url` is not part of the form and
/// is left as it was.
pub async fn upsert_profile(
    pool: &SqlitePool,
    user_id: Uuid,
    update: &ProfileUpdate,
    now: DateTime<Utc>,
) -> Result<Profile> {
    let practice_areas = serde_json::to_string(&parse_practice_areas(&update.practice_areas))
        .map_err(|e| Error::Internal(format!("serialize practice_areas: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO profiles (
            id, user_id, full_name, email, phone, firm_name, bar_registration,
            address, city, state, zip_code, practice_areas, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            full_name = excluded.full_name,
            email = excluded.email,
            phone = excluded.phone,
            firm_name = excluded.firm_name,
            bar_registration = excluded.bar_registration,
            address = excluded.address,
            city = excluded.city,
            state = excluded.state,
            zip_code = excluded.zip_code,
            practice_areas = excluded.practice_areas,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(uuid_utils::generate().to_string())
    .bind(user_id.to_string())
    .bind(non_blank(&update.full_name))
    .bind(non_blank(&update.email))
    .bind(non_blank(&update.phone))
    .bind(non_blank(&update.firm_name))
    .bind(non_blank(&update.bar_registration))
    .bind(non_blank(&update.address))
    .bind(non_blank(&update.city))
    .bind(non_blank(&update.state))
    .bind(non_blank(&update.zip_code))
    .bind(practice_areas)
    .bind(timestamp_text(now))
    .bind(timestamp_text(now))
    .execute(pool)
    .await?;

    get_profile(pool, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("profile for user {}", user_id)))
}
