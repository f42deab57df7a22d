//! Character progression queries

use raidprog_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{decode_time, encode_time, encounters};
use crate::models::{CharacterProgression, ProgressionEntry};

const COLUMNS: &str = "p.id, p.character_id, p.encounter_id, p.report_id, p.game_version, \
    p.is_kill, p.fight_percentage, p.phase, p.phase_percentage, p.duration_ms, \
    p.is_standard_composition, p.has_echo, p.job, p.recorded_at, p.first_kill_at";

fn from_row(row: &SqliteRow) -> Result<CharacterProgression> {
    let recorded_at: String = row.try_get("recorded_at")?;
    let first_kill_at: Option<String> = row.try_get("first_kill_at")?;
    Ok(CharacterProgression {
        id: row.try_get("id")?,
        character_id: row.try_get("character_id")?,
        encounter_id: row.try_get("encounter_id")?,
        report_id: row.try_get("report_id")?,
        game_version: row.try_get("game_version")?,
        is_kill: row.try_get("is_kill")?,
        fight_percentage: row.try_get("fight_percentage")?,
        phase: row.try_get("phase")?,
        phase_percentage: row.try_get("phase_percentage")?,
        duration_ms: row.try_get("duration_ms")?,
        is_standard_composition: row.try_get("is_standard_composition")?,
        has_echo: row.try_get("has_echo")?,
        job: row.try_get("job")?,
        recorded_at: decode_time(&recorded_at)?,
        first_kill_at: first_kill_at.as_deref().map(decode_time).transpose()?,
    })
}

/// Stored best progression of a character at an encounter
pub async fn find_for_character_encounter(
    pool: &SqlitePool,
    character_id: i64,
    encounter_id: i64,
) -> Result<Option<CharacterProgression>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM character_progressions p WHERE p.character_id = ? AND p.encounter_id = ?",
        COLUMNS
    ))
    .bind(character_id)
    .bind(encounter_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(from_row).transpose()
}

/// Insert a progression row, returning its id
pub async fn insert(pool: &SqlitePool, progression: &CharacterProgression) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO character_progressions (
            character_id, encounter_id, report_id, game_version,
            is_kill, fight_percentage, phase, phase_percentage, duration_ms,
            is_standard_composition, has_echo, job, recorded_at, first_kill_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(progression.character_id)
    .bind(progression.encounter_id)
    .bind(&progression.report_id)
    .bind(progression.game_version)
    .bind(progression.is_kill)
    .bind(progression.fight_percentage)
    .bind(progression.phase)
    .bind(progression.phase_percentage)
    .bind(progression.duration_ms)
    .bind(progression.is_standard_composition)
    .bind(progression.has_echo)
    .bind(&progression.job)
    .bind(encode_time(&progression.recorded_at))
    .bind(progression.first_kill_at.as_ref().map(encode_time))
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Overwrite an existing progression row in place
pub async fn update(pool: &SqlitePool, progression: &CharacterProgression) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE character_progressions SET
            report_id = ?, game_version = ?, is_kill = ?, fight_percentage = ?,
            phase = ?, phase_percentage = ?, duration_ms = ?,
            is_standard_composition = ?, has_echo = ?, job = ?,
            recorded_at = ?, first_kill_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&progression.report_id)
    .bind(progression.game_version)
    .bind(progression.is_kill)
    .bind(progression.fight_percentage)
    .bind(progression.phase)
    .bind(progression.phase_percentage)
    .bind(progression.duration_ms)
    .bind(progression.is_standard_composition)
    .bind(progression.has_echo)
    .bind(&progression.job)
    .bind(encode_time(&progression.recorded_at))
    .bind(progression.first_kill_at.as_ref().map(encode_time))
    .bind(progression.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Best progressions of a character with their encounters
///
/// Ordered kills first, then by lowest fight percentage, then most recent.
pub async fn best_for_character(
    pool: &SqlitePool,
    character_id: i64,
) -> Result<Vec<ProgressionEntry>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}, e.id AS e_id, e.compare_hash, e.zone_id, e.zone_name, e.difficulty, e.boss_id
        FROM character_progressions p
        JOIN encounters e ON e.id = p.encounter_id
        WHERE p.character_id = ?
        ORDER BY p.is_kill DESC, p.fight_percentage ASC, p.recorded_at DESC
        "#,
        COLUMNS
    ))
    .bind(character_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<ProgressionEntry> {
            let progression = from_row(row)?;
            // "id" resolves to the progression id in this join
            let mut encounter = encounters::from_row(row)?;
            encounter.id = row.try_get("e_id")?;
            Ok(ProgressionEntry {
                progression,
                encounter,
            })
        })
        .collect()
}
