//! Progression extractor
//!
//! Reduces a raw report to one best-attempt summary per character per
//! encounter. Within a report:
//! - if the character killed the encounter, the shortest kill is best
//! - otherwise the attempt with the lowest fight percentage is best
//!
//! Ties keep the first attempt in report order. Only attempts passing the
//! validity filter, with an end time that maps to a real timestamp, are
//! considered.

use chrono::{DateTime, Utc};

use crate::models::{Attempt, BestAttemptSummary, CharacterReport, RawReport, ReportCharacter};
use crate::services::identity::{character_hash, encounter_hash};
use crate::services::validity::is_valid_attempt;

/// Known metrics of a valid attempt
struct ValidAttempt<'a> {
    attempt: &'a Attempt,
    encounter_hash: String,
    difficulty: i64,
    kill: bool,
    fight_percentage: i64,
    boss_percentage: i64,
    duration_ms: i64,
    ended_at: DateTime<Utc>,
}

impl<'a> ValidAttempt<'a> {
    fn new(attempt: &'a Attempt, report_start: i64) -> Option<Self> {
        if !is_valid_attempt(attempt) {
            return None;
        }
        let ended_at = attempt
            .ended_at_ms(report_start)
            .and_then(DateTime::<Utc>::from_timestamp_millis)?;
        Some(Self {
            attempt,
            encounter_hash: encounter_hash(attempt.zone_id),
            difficulty: attempt.difficulty?,
            kill: attempt.kill?,
            fight_percentage: attempt.fight_percentage?,
            boss_percentage: attempt.boss_percentage?,
            duration_ms: attempt.duration_ms()?,
            ended_at,
        })
    }
}

/// Best attempt per encounter for one character, in first-attempted order
///
/// Returns an empty list when the character has no valid attempt.
pub fn extract_best(report: &RawReport, character: &ReportCharacter) -> Vec<BestAttemptSummary> {
    let attempts: Vec<ValidAttempt<'_>> = report
        .attempts
        .iter()
        .filter(|attempt| character.took_part_in(attempt))
        .filter_map(|attempt| ValidAttempt::new(attempt, report.start))
        .collect();

    let mut encounter_order: Vec<&str> = Vec::new();
    for attempt in &attempts {
        if !encounter_order.contains(&attempt.encounter_hash.as_str()) {
            encounter_order.push(&attempt.encounter_hash);
        }
    }

    encounter_order
        .into_iter()
        .filter_map(|hash| {
            let in_encounter = attempts.iter().filter(|a| a.encounter_hash == hash);
            select_best(in_encounter).map(|best| summarize(report, character, best))
        })
        .collect()
}

/// Pick the best attempt among one encounter's valid attempts
fn select_best<'a, 'b, I>(attempts: I) -> Option<&'b ValidAttempt<'a>>
where
    I: Iterator<Item = &'b ValidAttempt<'a>> + Clone,
{
    let has_kill = attempts.clone().any(|a| a.kill);

    let mut best: Option<&ValidAttempt<'a>> = None;
    for candidate in attempts.filter(|a| a.kill == has_kill) {
        let better = match best {
            None => true,
            Some(current) if has_kill => candidate.duration_ms < current.duration_ms,
            Some(current) => candidate.fight_percentage < current.fight_percentage,
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

fn summarize(
    report: &RawReport,
    character: &ReportCharacter,
    best: &ValidAttempt<'_>,
) -> BestAttemptSummary {
    let attempt = best.attempt;
    BestAttemptSummary {
        encounter_hash: best.encounter_hash.clone(),
        zone_id: attempt.zone_id,
        zone_name: attempt.zone_name.clone(),
        boss_id: attempt.boss_id,
        difficulty: best.difficulty,
        game_version: report.game_version,
        is_kill: best.kill,
        duration_ms: best.duration_ms,
        fight_percentage: best.fight_percentage,
        phase: attempt.last_phase,
        phase_percentage: best.boss_percentage,
        is_standard_composition: attempt.standard_composition,
        has_echo: false,
        job: character.job.clone(),
        ended_at: best.ended_at,
    }
}

/// Extract every character with at least one best attempt
///
/// Characters missing a name, server or job are left out, as are characters
/// with no valid attempt at all.
pub fn extract_report(report: &RawReport) -> Vec<CharacterReport> {
    report
        .characters
        .iter()
        .filter(|character| character.is_identifiable())
        .filter_map(|character| {
            let summaries = extract_best(report, character);
            if summaries.is_empty() {
                return None;
            }
            Some(CharacterReport {
                character_hash: character_hash(&character.name, &character.server),
                character: character.clone(),
                summaries,
            })
        })
        .collect()
}
