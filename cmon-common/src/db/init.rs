//! Database initialization
//!
//! Opens (creating if needed) the SQLite file and creates the tables with
//! `CREATE TABLE IF NOT EXISTS`, so it is safe on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Foreign keys are a per-connection setting, so they go on the connect
    // options rather than a one-off PRAGMA.
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database (tests, demo runs)
///
/// Every connection to `sqlite::memory:` is a separate database, so the pool
/// is pinned to one connection that never expires.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_court_cases_table(pool).await?;
    create_court_orders_table(pool).await?;
    create_profiles_table(pool).await?;
    Ok(())
}

async fn create_court_cases_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS court_cases (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            case_number TEXT NOT NULL,
            petitioner TEXT NOT NULL DEFAULT '',
            respondent TEXT NOT NULL DEFAULT '',
            court_name TEXT NOT NULL DEFAULT '',
            case_type TEXT,
            case_summary TEXT,
            filing_date TEXT,
            latest_order_date TEXT NOT NULL,
            next_hearing_date TEXT,
            urgency TEXT NOT NULL DEFAULT 'normal'
                CHECK (urgency IN ('urgent', 'warning', 'normal')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_court_cases_user ON court_cases(user_id)")
        .execute(pool)
        .await?;
    // One case per (user, number); replaces the earlier non-unique index
    sqlx::query("DROP INDEX IF EXISTS idx_court_cases_number")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_court_cases_user_number \
         ON court_cases(user_id, case_number)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_court_orders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS court_orders (
            id TEXT PRIMARY KEY,
            case_id TEXT NOT NULL REFERENCES court_cases(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            order_date TEXT NOT NULL,
            uploaded_at TEXT NOT NULL,
            file_name TEXT NOT NULL,
            file_url TEXT NOT NULL DEFAULT '',
            file_type TEXT NOT NULL DEFAULT 'application/pdf',
            court_order_file_name TEXT,
            court_order_file_url TEXT,
            case_status_file_name TEXT,
            case_status_file_url TEXT,
            thumbnail_url TEXT,
            deadline TEXT,
            summary TEXT,
            action_required TEXT,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'in-progress', 'completed')),
            completion_date TEXT,
            completion_document_url TEXT,
            extracted_data TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_court_orders_case ON court_orders(case_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_court_orders_user ON court_orders(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            full_name TEXT,
            email TEXT,
            phone TEXT,
            firm_name TEXT,
            bar_registration TEXT,
            address TEXT,
            city TEXT,
            state TEXT,
            zip_code TEXT,
            practice_areas TEXT NOT NULL DEFAULT '[]',
            avatar_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_tables_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        create_tables(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["court_cases", "court_orders", "profiles"]);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = init_memory_database().await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
