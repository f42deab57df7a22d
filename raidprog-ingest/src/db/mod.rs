//! Database access for raidprog-ingest
//!
//! SQLite via sqlx. Each submodule owns the queries for one table; only the
//! sync engine calls the write functions.

pub mod characters;
pub mod encounters;
pub mod imports;
pub mod progressions;

use chrono::{DateTime, SecondsFormat, Utc};
use raidprog_common::{Error, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the database file and parent directory when missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// The connection is never recycled, so the database lives as long as the pool.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS characters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            public_id TEXT NOT NULL UNIQUE,
            compare_hash TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            server TEXT NOT NULL,
            job TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS encounters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            compare_hash TEXT NOT NULL UNIQUE,
            zone_id INTEGER NOT NULL,
            zone_name TEXT NOT NULL,
            difficulty INTEGER NOT NULL,
            boss_id INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS character_progressions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            character_id INTEGER NOT NULL REFERENCES characters(id),
            encounter_id INTEGER NOT NULL REFERENCES encounters(id),
            report_id TEXT NOT NULL,
            game_version INTEGER NOT NULL,
            is_kill INTEGER NOT NULL,
            fight_percentage INTEGER NOT NULL,
            phase INTEGER,
            phase_percentage INTEGER NOT NULL,
            duration_ms INTEGER NOT NULL,
            is_standard_composition INTEGER,
            has_echo INTEGER NOT NULL,
            job TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            first_kill_at TEXT,
            UNIQUE (character_id, encounter_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_character_progressions_report ON character_progressions(report_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS report_imports (
            report_id TEXT PRIMARY KEY,
            imported_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (characters, encounters, character_progressions, report_imports)"
    );

    Ok(())
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically
pub(crate) fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp '{}' in database: {}", value, e)))
}
