//! Raw report structure as returned by the report fetch collaborator
//!
//! Every per-attempt metric the log provider may omit is an `Option`.
//! Consumers treat `None` as "unknown" and exclude the attempt rather than
//! substituting a default.

use serde::{Deserialize, Serialize};

/// One fetched combat-log report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    /// Report start, unix epoch milliseconds
    pub start: i64,
    /// Game version tag reported by the log provider
    pub game_version: i64,
    /// Every attempt recorded in the report, in report order
    pub attempts: Vec<Attempt>,
    /// Participating player characters
    pub characters: Vec<ReportCharacter>,
}

/// One recorded try at an encounter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Attempt id, unique within its report only
    pub id: i64,
    pub zone_id: i64,
    pub zone_name: String,
    pub boss_id: i64,
    pub difficulty: Option<i64>,
    /// Offset from report start, milliseconds
    pub start_time: i64,
    /// Offset from report start, milliseconds
    pub end_time: i64,
    pub kill: Option<bool>,
    /// Remaining fight completion, 10000 = 100.00%
    pub fight_percentage: Option<i64>,
    /// Remaining completion of the current phase, 10000 = 100.00%
    pub boss_percentage: Option<i64>,
    pub last_phase: Option<i64>,
    pub has_echo: Option<bool>,
    pub standard_composition: Option<bool>,
}

impl Attempt {
    /// Attempt length in milliseconds
    ///
    /// `None` when the end offset precedes the start offset or the difference
    /// does not fit.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .checked_sub(self.start_time)
            .filter(|duration| *duration >= 0)
    }

    /// Absolute end of the attempt, unix epoch milliseconds
    pub fn ended_at_ms(&self, report_start: i64) -> Option<i64> {
        report_start.checked_add(self.end_time)
    }
}

/// A player character taking part in a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportCharacter {
    pub name: String,
    pub server: String,
    /// Job name as reported (e.g. "WhiteMage")
    pub job: String,
    /// Ids of the attempts this character took part in
    pub attempt_ids: Vec<i64>,
}

impl ReportCharacter {
    /// Whether the character took part in the given attempt
    pub fn took_part_in(&self, attempt: &Attempt) -> bool {
        self.attempt_ids.contains(&attempt.id)
    }

    /// Name, server and job are all present
    pub fn is_identifiable(&self) -> bool {
        !self.name.is_empty() && !self.server.is_empty() && !self.job.is_empty()
    }
}
