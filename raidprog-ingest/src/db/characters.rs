//! Character queries

use chrono::Utc;
use raidprog_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::encode_time;
use crate::models::Character;

const COLUMNS: &str = "id, public_id, compare_hash, name, server, job";

fn from_row(row: &SqliteRow) -> Result<Character> {
    Ok(Character {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        compare_hash: row.try_get("compare_hash")?,
        name: row.try_get("name")?,
        server: row.try_get("server")?,
        job: row.try_get("job")?,
    })
}

/// Look up a character by identity hash
pub async fn find_by_hash(pool: &SqlitePool, compare_hash: &str) -> Result<Option<Character>> {
    let row = sqlx::query(&format!("SELECT {} FROM characters WHERE compare_hash = ?", COLUMNS))
        .bind(compare_hash)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Look up a character by public id
pub async fn find_by_public_id(pool: &SqlitePool, public_id: &str) -> Result<Option<Character>> {
    let row = sqlx::query(&format!("SELECT {} FROM characters WHERE public_id = ?", COLUMNS))
        .bind(public_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Whether a public id is already taken
pub async fn public_id_exists(pool: &SqlitePool, public_id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM characters WHERE public_id = ?")
        .bind(public_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Insert a character, returning it with its assigned id
pub async fn insert(
    pool: &SqlitePool,
    public_id: &str,
    compare_hash: &str,
    name: &str,
    server: &str,
    job: &str,
) -> Result<Character> {
    let result = sqlx::query(
        r#"
        INSERT INTO characters (public_id, compare_hash, name, server, job, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(public_id)
    .bind(compare_hash)
    .bind(name)
    .bind(server)
    .bind(job)
    .bind(encode_time(&Utc::now()))
    .execute(pool)
    .await?;

    Ok(Character {
        id: result.last_insert_rowid(),
        public_id: public_id.to_string(),
        compare_hash: compare_hash.to_string(),
        name: name.to_string(),
        server: server.to_string(),
        job: job.to_string(),
    })
}

/// Update the mutable display fields of a character
pub async fn update_job(pool: &SqlitePool, id: i64, job: &str) -> Result<()> {
    sqlx::query("UPDATE characters SET job = ? WHERE id = ?")
        .bind(job)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Case-insensitive name substring search, ordered by name
///
/// `%` and `_` in the input match literally.
pub async fn search_by_name(
    pool: &SqlitePool,
    fragment: &str,
    limit: i64,
) -> Result<Vec<Character>> {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = format!("%{}%", escaped);

    let rows = sqlx::query(&format!(
        "SELECT {} FROM characters WHERE name LIKE ? ESCAPE '\\' ORDER BY name, server LIMIT ?",
        COLUMNS
    ))
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}
