//! Best-attempt summaries produced by the progression extractor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReportCharacter;

/// The single best attempt of one character at one encounter within a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestAttemptSummary {
    /// Encounter identity hash
    pub encounter_hash: String,
    pub zone_id: i64,
    pub zone_name: String,
    pub boss_id: i64,
    pub difficulty: i64,
    pub game_version: i64,
    pub is_kill: bool,
    pub duration_ms: i64,
    /// Lower is more progress, 10000 = 100.00%
    pub fight_percentage: i64,
    /// Phase the attempt ended in, when reported
    pub phase: Option<i64>,
    pub phase_percentage: i64,
    pub is_standard_composition: Option<bool>,
    pub has_echo: bool,
    pub job: String,
    /// End of the attempt (report start + attempt end offset)
    pub ended_at: DateTime<Utc>,
}

/// A character together with its per-encounter best attempts for one report
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterReport {
    pub character_hash: String,
    pub character: ReportCharacter,
    /// Never empty
    pub summaries: Vec<BestAttemptSummary>,
}
