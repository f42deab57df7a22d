//! Report import ledger

use chrono::Utc;
use raidprog_common::Result;
use sqlx::{Row, SqlitePool};

use super::{decode_time, encode_time};
use crate::models::ImportRecord;

/// Whether a report has been fully processed
pub async fn is_imported(pool: &SqlitePool, report_id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM report_imports WHERE report_id = ?")
        .bind(report_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Mark a report processed; a second call keeps the original timestamp
pub async fn record(pool: &SqlitePool, report_id: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO report_imports (report_id, imported_at) VALUES (?, ?)")
        .bind(report_id)
        .bind(encode_time(&Utc::now()))
        .execute(pool)
        .await?;
    Ok(())
}

/// Ledger entry for a report, if processed
pub async fn find(pool: &SqlitePool, report_id: &str) -> Result<Option<ImportRecord>> {
    let row = sqlx::query("SELECT report_id, imported_at FROM report_imports WHERE report_id = ?")
        .bind(report_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let imported_at: String = row.try_get("imported_at")?;
            Ok(Some(ImportRecord {
                report_id: row.try_get("report_id")?,
                imported_at: decode_time(&imported_at)?,
            }))
        }
        None => Ok(None),
    }
}
