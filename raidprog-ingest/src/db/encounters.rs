//! Encounter queries

use chrono::Utc;
use raidprog_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::encode_time;
use crate::models::EncounterInfo;

const COLUMNS: &str = "id, compare_hash, zone_id, zone_name, difficulty, boss_id";

pub(crate) fn from_row(row: &SqliteRow) -> Result<EncounterInfo> {
    Ok(EncounterInfo {
        id: row.try_get("id")?,
        compare_hash: row.try_get("compare_hash")?,
        zone_id: row.try_get("zone_id")?,
        zone_name: row.try_get("zone_name")?,
        difficulty: row.try_get("difficulty")?,
        boss_id: row.try_get("boss_id")?,
    })
}

/// Look up an encounter by identity hash
pub async fn find_by_hash(pool: &SqlitePool, compare_hash: &str) -> Result<Option<EncounterInfo>> {
    let row = sqlx::query(&format!("SELECT {} FROM encounters WHERE compare_hash = ?", COLUMNS))
        .bind(compare_hash)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Insert an encounter, returning it with its assigned id
pub async fn insert(
    pool: &SqlitePool,
    compare_hash: &str,
    zone_id: i64,
    zone_name: &str,
    difficulty: i64,
    boss_id: i64,
) -> Result<EncounterInfo> {
    let result = sqlx::query(
        r#"
        INSERT INTO encounters (compare_hash, zone_id, zone_name, difficulty, boss_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(compare_hash)
    .bind(zone_id)
    .bind(zone_name)
    .bind(difficulty)
    .bind(boss_id)
    .bind(encode_time(&Utc::now()))
    .execute(pool)
    .await?;

    Ok(EncounterInfo {
        id: result.last_insert_rowid(),
        compare_hash: compare_hash.to_string(),
        zone_id,
        zone_name: zone_name.to_string(),
        difficulty,
        boss_id,
    })
}

/// All known encounters, ordered by zone id
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<EncounterInfo>> {
    let rows = sqlx::query(&format!("SELECT {} FROM encounters ORDER BY zone_id", COLUMNS))
        .fetch_all(pool)
        .await?;
    rows.iter().map(from_row).collect()
}
