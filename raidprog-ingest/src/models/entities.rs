//! Persisted entities
//!
//! Rows are written only by the sync engine. Surrogate ids (`id`) are local
//! to this database; cross-report matching always goes through the
//! `compare_hash` columns.

use chrono::{DateTime, Utc};
use raidprog_common::config::DisplayCategory;
use serde::Serialize;

use super::jobs::job_abbreviation;
use super::BestAttemptSummary;

/// Zone name markers of the hardest content tiers
const DISPLAYABLE_MARKERS: [&str; 3] = ["Savage", "Ultimate", "Extreme"];

/// A player character
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Character {
    #[serde(skip)]
    pub id: i64,
    /// Short random id used in lookup URLs
    pub public_id: String,
    #[serde(skip)]
    pub compare_hash: String,
    pub name: String,
    pub server: String,
    /// Most recently seen job
    pub job: String,
}

impl Character {
    pub fn job_abbreviation(&self) -> Option<&'static str> {
        job_abbreviation(&self.job)
    }
}

/// A trackable encounter (zone/boss/difficulty)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncounterInfo {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub compare_hash: String,
    pub zone_id: i64,
    pub zone_name: String,
    pub difficulty: i64,
    pub boss_id: i64,
}

impl EncounterInfo {
    /// High-end content is shown on character pages
    pub fn is_displayable(&self) -> bool {
        DISPLAYABLE_MARKERS
            .iter()
            .any(|marker| self.zone_name.contains(marker))
    }
}

/// Current best known attempt of a character at an encounter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterProgression {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub character_id: i64,
    #[serde(skip)]
    pub encounter_id: i64,
    /// Report the current best was recorded from
    pub report_id: String,
    pub game_version: i64,
    pub is_kill: bool,
    /// Lower is more progress, 10000 = 100.00%
    pub fight_percentage: i64,
    pub phase: Option<i64>,
    pub phase_percentage: i64,
    pub duration_ms: i64,
    pub is_standard_composition: Option<bool>,
    pub has_echo: bool,
    pub job: String,
    /// End of the best attempt
    pub recorded_at: DateTime<Utc>,
    /// End of the earliest known kill
    pub first_kill_at: Option<DateTime<Utc>>,
}

impl CharacterProgression {
    /// Overwrite the best-attempt fields from a summary
    ///
    /// `first_kill_at` only ever moves earlier.
    pub fn apply_summary(&mut self, report_id: &str, summary: &BestAttemptSummary) {
        self.report_id = report_id.to_string();
        self.game_version = summary.game_version;
        self.is_kill = summary.is_kill;
        self.fight_percentage = summary.fight_percentage;
        self.phase = summary.phase;
        self.phase_percentage = summary.phase_percentage;
        self.duration_ms = summary.duration_ms;
        self.is_standard_composition = summary.is_standard_composition;
        self.has_echo = summary.has_echo;
        self.job = summary.job.clone();
        self.recorded_at = summary.ended_at;
        if summary.is_kill {
            self.first_kill_at = Some(match self.first_kill_at {
                Some(existing) if existing < summary.ended_at => existing,
                _ => summary.ended_at,
            });
        }
    }

    /// Fresh row for a character/encounter pair
    pub fn from_summary(
        character_id: i64,
        encounter_id: i64,
        report_id: &str,
        summary: &BestAttemptSummary,
    ) -> Self {
        let mut progression = Self {
            id: 0,
            character_id,
            encounter_id,
            report_id: String::new(),
            game_version: 0,
            is_kill: false,
            fight_percentage: 0,
            phase: None,
            phase_percentage: 0,
            duration_ms: 0,
            is_standard_composition: None,
            has_echo: false,
            job: String::new(),
            recorded_at: summary.ended_at,
            first_kill_at: None,
        };
        progression.apply_summary(report_id, summary);
        progression
    }
}

/// Progression row joined with its encounter, for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressionEntry {
    #[serde(flatten)]
    pub progression: CharacterProgression,
    pub encounter: EncounterInfo,
}

/// Ledger entry for a fully processed report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRecord {
    pub report_id: String,
    pub imported_at: DateTime<Utc>,
}

/// A configured display category with the known encounters it contains
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayEncounterGroup {
    pub category: String,
    pub encounters: Vec<EncounterInfo>,
}

/// Group known encounters under the configured display categories
///
/// Categories keep their configured order and encounters follow the order of
/// `boss_ids`. Categories with no known encounter are left out.
pub fn group_for_display(
    encounters: &[EncounterInfo],
    categories: &[DisplayCategory],
) -> Vec<DisplayEncounterGroup> {
    categories
        .iter()
        .filter_map(|category| {
            let matched: Vec<EncounterInfo> = category
                .boss_ids
                .iter()
                .filter_map(|boss_id| encounters.iter().find(|e| e.boss_id == *boss_id).cloned())
                .collect();
            if matched.is_empty() {
                None
            } else {
                Some(DisplayEncounterGroup {
                    category: category.name.clone(),
                    encounters: matched,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn encounter(boss_id: i64, zone_name: &str) -> EncounterInfo {
        EncounterInfo {
            id: boss_id,
            compare_hash: format!("hash-{}", boss_id),
            zone_id: boss_id + 1000,
            zone_name: zone_name.to_string(),
            difficulty: 101,
            boss_id,
        }
    }

    fn summary(is_kill: bool, ended_ms: i64) -> BestAttemptSummary {
        BestAttemptSummary {
            encounter_hash: "e".to_string(),
            zone_id: 1,
            zone_name: "Zone (Savage)".to_string(),
            boss_id: 1,
            difficulty: 101,
            game_version: 1,
            is_kill,
            duration_ms: 1000,
            fight_percentage: if is_kill { 0 } else { 4500 },
            phase: Some(1),
            phase_percentage: 0,
            is_standard_composition: Some(true),
            has_echo: false,
            job: "Paladin".to_string(),
            ended_at: Utc.timestamp_millis_opt(ended_ms).unwrap(),
        }
    }

    #[test]
    fn test_is_displayable_markers() {
        assert!(encounter(1, "Abyssos: The Fifth Circle (Savage)").is_displayable());
        assert!(encounter(2, "The Omega Protocol (Ultimate)").is_displayable());
        assert!(encounter(3, "The Minstrel's Ballad: Endsinger's Aria (Extreme)").is_displayable());
        assert!(!encounter(4, "Abyssos: The Fifth Circle").is_displayable());
    }

    #[test]
    fn test_group_for_display_order_and_filtering() {
        let known = vec![encounter(10, "A (Savage)"), encounter(20, "B (Savage)")];
        let categories = vec![
            DisplayCategory {
                name: "Empty".to_string(),
                boss_ids: vec![99],
            },
            DisplayCategory {
                name: "Tier".to_string(),
                boss_ids: vec![20, 10, 30],
            },
        ];

        let groups = group_for_display(&known, &categories);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category, "Tier");
        let bosses: Vec<i64> = groups[0].encounters.iter().map(|e| e.boss_id).collect();
        assert_eq!(bosses, vec![20, 10]);
    }

    #[test]
    fn test_first_kill_only_moves_earlier() {
        let mut progression = CharacterProgression::from_summary(1, 1, "A", &summary(false, 1_000));
        assert_eq!(progression.first_kill_at, None);

        progression.apply_summary("B", &summary(true, 5_000));
        assert_eq!(progression.first_kill_at, Some(Utc.timestamp_millis_opt(5_000).unwrap()));

        // A later, faster kill keeps the original first kill time
        progression.apply_summary("C", &summary(true, 9_000));
        assert_eq!(progression.first_kill_at, Some(Utc.timestamp_millis_opt(5_000).unwrap()));
        assert_eq!(progression.report_id, "C");
        assert_eq!(progression.recorded_at, Utc.timestamp_millis_opt(9_000).unwrap());
    }
}
