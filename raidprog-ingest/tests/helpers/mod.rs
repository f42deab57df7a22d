//! Shared fixtures for raidprog-ingest integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use raidprog_ingest::models::{Attempt, RawReport, ReportCharacter};
use raidprog_ingest::services::{FetchError, ReportFetcher};
use sqlx::SqlitePool;

pub const P5S: i64 = 1077;
pub const P6S: i64 = 1078;
pub const DUNGEON: i64 = 1070;

/// Report start used by every built report
pub const REPORT_START: i64 = 1_700_000_000_000;

/// Savage attempt with every metric known
pub fn attempt(id: i64, zone_id: i64, kill: bool, fight_percentage: i64, start: i64, end: i64) -> Attempt {
    Attempt {
        id,
        zone_id,
        zone_name: format!("Abyssos {} (Savage)", zone_id),
        boss_id: zone_id - 1000,
        difficulty: Some(101),
        start_time: start,
        end_time: end,
        kill: Some(kill),
        fight_percentage: Some(fight_percentage),
        boss_percentage: Some(fight_percentage),
        last_phase: Some(1),
        has_echo: Some(false),
        standard_composition: Some(true),
    }
}

pub fn character(name: &str, job: &str, attempt_ids: &[i64]) -> ReportCharacter {
    ReportCharacter {
        name: name.to_string(),
        server: "Gilgamesh".to_string(),
        job: job.to_string(),
        attempt_ids: attempt_ids.to_vec(),
    }
}

/// Builder for raw reports
#[derive(Default)]
pub struct ReportBuilder {
    report: RawReport,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            report: RawReport {
                start: REPORT_START,
                game_version: 6,
                ..RawReport::default()
            },
        }
    }

    /// Report start, unix epoch milliseconds
    pub fn start(mut self, start: i64) -> Self {
        self.report.start = start;
        self
    }

    pub fn attempt(mut self, attempt: Attempt) -> Self {
        self.report.attempts.push(attempt);
        self
    }

    pub fn character(mut self, character: ReportCharacter) -> Self {
        self.report.characters.push(character);
        self
    }

    pub fn build(self) -> RawReport {
        self.report
    }
}

/// Single character, single encounter, one wipe at `fight_percentage`
pub fn wipe_report(name: &str, fight_percentage: i64) -> RawReport {
    ReportBuilder::new()
        .attempt(attempt(1, P5S, false, fight_percentage, 0, 300_000))
        .character(character(name, "Paladin", &[1]))
        .build()
}

/// Single character, single encounter, one kill lasting `duration_ms`
pub fn kill_report(name: &str, duration_ms: i64) -> RawReport {
    ReportBuilder::new()
        .attempt(attempt(1, P5S, true, 0, 0, duration_ms))
        .character(character(name, "Paladin", &[1]))
        .build()
}

/// In-memory report source
#[derive(Default)]
pub struct FakeFetcher {
    reports: HashMap<String, RawReport>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(mut self, report_id: &str, report: RawReport) -> Self {
        self.reports.insert(report_id.to_string(), report);
        self
    }

    /// Ids requested so far, in call order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportFetcher for FakeFetcher {
    async fn fetch_report(&self, report_id: &str) -> Result<RawReport, FetchError> {
        self.fetched.lock().unwrap().push(report_id.to_string());
        self.reports
            .get(report_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(report_id.to_string()))
    }
}

/// Every stored row, rendered as text, for whole-database comparisons
pub async fn snapshot(pool: &SqlitePool) -> Vec<String> {
    let queries = [
        "SELECT 'character|' || quote(id) || '|' || quote(public_id) || '|' || quote(compare_hash) || '|' \
         || quote(name) || '|' || quote(server) || '|' || quote(job) || '|' || quote(created_at) \
         FROM characters ORDER BY id",
        "SELECT 'encounter|' || quote(id) || '|' || quote(compare_hash) || '|' || quote(zone_id) || '|' \
         || quote(zone_name) || '|' || quote(difficulty) || '|' || quote(boss_id) || '|' || quote(created_at) \
         FROM encounters ORDER BY id",
        "SELECT 'progression|' || quote(id) || '|' || quote(character_id) || '|' || quote(encounter_id) || '|' \
         || quote(report_id) || '|' || quote(game_version) || '|' || quote(is_kill) || '|' \
         || quote(fight_percentage) || '|' || quote(phase) || '|' || quote(phase_percentage) || '|' \
         || quote(duration_ms) || '|' || quote(is_standard_composition) || '|' || quote(has_echo) || '|' \
         || quote(job) || '|' || quote(recorded_at) || '|' || quote(first_kill_at) \
         FROM character_progressions ORDER BY id",
        "SELECT 'import|' || quote(report_id) || '|' || quote(imported_at) FROM report_imports ORDER BY report_id",
    ];

    let mut rows = Vec::new();
    for query in queries {
        let table: Vec<String> = sqlx::query_scalar(query).fetch_all(pool).await.unwrap();
        rows.extend(table);
    }
    rows
}

/// Like [`snapshot`], without random public ids and wall-clock timestamps
///
/// Two databases that received the same reports compare equal.
pub async fn stable_snapshot(pool: &SqlitePool) -> Vec<String> {
    let queries = [
        "SELECT 'character|' || quote(id) || '|' || quote(compare_hash) || '|' || quote(name) || '|' \
         || quote(server) || '|' || quote(job) FROM characters ORDER BY id",
        "SELECT 'encounter|' || quote(id) || '|' || quote(compare_hash) || '|' || quote(zone_id) || '|' \
         || quote(zone_name) || '|' || quote(difficulty) || '|' || quote(boss_id) FROM encounters ORDER BY id",
        "SELECT 'progression|' || quote(id) || '|' || quote(character_id) || '|' || quote(encounter_id) || '|' \
         || quote(report_id) || '|' || quote(is_kill) || '|' || quote(fight_percentage) || '|' \
         || quote(phase) || '|' || quote(duration_ms) || '|' || quote(is_standard_composition) || '|' \
         || quote(job) || '|' || quote(recorded_at) || '|' || quote(first_kill_at) \
         FROM character_progressions ORDER BY id",
        "SELECT 'import|' || quote(report_id) FROM report_imports ORDER BY report_id",
    ];

    let mut rows = Vec::new();
    for query in queries {
        let table: Vec<String> = sqlx::query_scalar(query).fetch_all(pool).await.unwrap();
        rows.extend(table);
    }
    rows
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}
