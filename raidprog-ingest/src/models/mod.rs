//! Data models for raidprog-ingest

pub mod entities;
pub mod jobs;
pub mod report;
pub mod summary;

pub use entities::{
    group_for_display, Character, CharacterProgression, DisplayEncounterGroup, EncounterInfo,
    ImportRecord, ProgressionEntry,
};
pub use report::{Attempt, RawReport, ReportCharacter};
pub use summary::{BestAttemptSummary, CharacterReport};
