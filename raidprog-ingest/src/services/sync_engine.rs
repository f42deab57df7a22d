//! Sync/merge engine
//!
//! Writes the best attempts of one report into storage:
//! 1. upsert characters by identity hash
//! 2. upsert encounters by identity hash (metadata fixed at creation)
//! 3. replace stored progression where the improvement policy allows
//! 4. record the report in the import ledger
//!
//! Every step is idempotent on its own, so a report interrupted by a storage
//! failure converges to the same state when processed again. The caller is
//! responsible for skipping reports that are already in the ledger.

use std::collections::HashMap;
use std::sync::Arc;

use raidprog_common::public_id;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use crate::db;
use crate::models::{
    BestAttemptSummary, Character, CharacterProgression, CharacterReport, EncounterInfo, RawReport,
};
use crate::services::extractor::extract_report;
use crate::services::improvement::is_improvement;

/// Public id generation attempts before giving up
pub const DEFAULT_PUBLIC_ID_ATTEMPTS: u32 = 8;

/// Sync engine errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// Storage read or write failed
    #[error("Storage error: {0}")]
    Storage(#[from] raidprog_common::Error),

    /// Every generated public id collided with a stored one
    #[error("No free public id after {0} attempts")]
    PublicIdExhausted(u32),
}

/// What a call to [`SyncEngine::handle_report`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub characters_created: usize,
    pub characters_updated: usize,
    pub encounters_created: usize,
    pub progressions_written: usize,
    pub progressions_skipped: usize,
}

/// Produces public id candidates for new characters
pub type PublicIdSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Applies extracted reports to storage
#[derive(Clone)]
pub struct SyncEngine {
    db: SqlitePool,
    public_id_attempts: u32,
    public_id_source: PublicIdSource,
}

impl SyncEngine {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            public_id_attempts: DEFAULT_PUBLIC_ID_ATTEMPTS,
            public_id_source: Arc::new(public_id::generate),
        }
    }

    /// Override the public id retry cap
    pub fn with_public_id_attempts(mut self, attempts: u32) -> Self {
        self.public_id_attempts = attempts;
        self
    }

    /// Override where public id candidates come from (random by default)
    pub fn with_public_id_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.public_id_source = Arc::new(source);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Whether the report is already in the import ledger
    pub async fn is_imported(&self, report_id: &str) -> Result<bool, SyncError> {
        Ok(db::imports::is_imported(&self.db, report_id).await?)
    }

    /// Apply one fetched report
    ///
    /// Storage failures abort the remaining steps and are returned as-is.
    pub async fn handle_report(
        &self,
        report_id: &str,
        report: &RawReport,
    ) -> Result<SyncSummary, SyncError> {
        let character_reports = extract_report(report);
        let mut summary = SyncSummary::default();

        // Step 1: characters
        let mut characters: Vec<(Character, &CharacterReport)> =
            Vec::with_capacity(character_reports.len());
        for character_report in &character_reports {
            let character = self.upsert_character(character_report, &mut summary).await?;
            characters.push((character, character_report));
        }

        // Step 2: encounters
        let mut encounters: HashMap<&str, EncounterInfo> = HashMap::new();
        for best in character_reports.iter().flat_map(|c| c.summaries.iter()) {
            if encounters.contains_key(best.encounter_hash.as_str()) {
                continue;
            }
            let encounter = self.upsert_encounter(best, &mut summary).await?;
            encounters.insert(&best.encounter_hash, encounter);
        }

        // Step 3: progression
        for (character, character_report) in &characters {
            for best in &character_report.summaries {
                let Some(encounter) = encounters.get(best.encounter_hash.as_str()) else {
                    continue;
                };
                let written = self.merge_progression(report_id, character, encounter, best).await?;
                if written {
                    summary.progressions_written += 1;
                } else {
                    summary.progressions_skipped += 1;
                }
            }
        }

        // Step 4: ledger
        db::imports::record(&self.db, report_id).await?;

        info!(
            report_id = %report_id,
            characters = character_reports.len(),
            characters_created = summary.characters_created,
            encounters_created = summary.encounters_created,
            progressions_written = summary.progressions_written,
            progressions_skipped = summary.progressions_skipped,
            "Report synchronized"
        );

        Ok(summary)
    }

    async fn upsert_character(
        &self,
        character_report: &CharacterReport,
        summary: &mut SyncSummary,
    ) -> Result<Character, SyncError> {
        let source = &character_report.character;

        let existing =
            db::characters::find_by_hash(&self.db, &character_report.character_hash).await?;
        if let Some(mut existing) = existing {
            if existing.job != source.job {
                db::characters::update_job(&self.db, existing.id, &source.job).await?;
                existing.job = source.job.clone();
                summary.characters_updated += 1;
            }
            return Ok(existing);
        }

        let public_id = self.generate_public_id().await?;
        let created = db::characters::insert(
            &self.db,
            &public_id,
            &character_report.character_hash,
            &source.name,
            &source.server,
            &source.job,
        )
        .await?;
        summary.characters_created += 1;

        debug!(
            name = %created.name,
            server = %created.server,
            public_id = %created.public_id,
            "Character created"
        );
        Ok(created)
    }

    /// Random public id not yet stored, with a bounded number of attempts
    async fn generate_public_id(&self) -> Result<String, SyncError> {
        for attempt in 1..=self.public_id_attempts {
            let candidate = (self.public_id_source)();
            if !db::characters::public_id_exists(&self.db, &candidate).await? {
                return Ok(candidate);
            }
            debug!(attempt, candidate = %candidate, "Public id collision, retrying");
        }
        Err(SyncError::PublicIdExhausted(self.public_id_attempts))
    }

    async fn upsert_encounter(
        &self,
        best: &BestAttemptSummary,
        summary: &mut SyncSummary,
    ) -> Result<EncounterInfo, SyncError> {
        let existing = db::encounters::find_by_hash(&self.db, &best.encounter_hash).await?;
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let created = db::encounters::insert(
            &self.db,
            &best.encounter_hash,
            best.zone_id,
            &best.zone_name,
            best.difficulty,
            best.boss_id,
        )
        .await?;
        summary.encounters_created += 1;

        debug!(zone_id = created.zone_id, zone_name = %created.zone_name, "Encounter created");
        Ok(created)
    }

    /// Returns whether the stored progression was written
    async fn merge_progression(
        &self,
        report_id: &str,
        character: &Character,
        encounter: &EncounterInfo,
        best: &BestAttemptSummary,
    ) -> Result<bool, SyncError> {
        let stored =
            db::progressions::find_for_character_encounter(&self.db, character.id, encounter.id)
                .await?;

        if stored.is_some() && !is_improvement(stored.as_ref(), best) {
            debug!(
                report_id = %report_id,
                character = %character.name,
                zone_id = encounter.zone_id,
                "Stored progression not improved, skipping"
            );
            return Ok(false);
        }

        match stored {
            Some(mut progression) => {
                progression.apply_summary(report_id, best);
                db::progressions::update(&self.db, &progression).await?;
            }
            None => {
                let progression =
                    CharacterProgression::from_summary(character.id, encounter.id, report_id, best);
                db::progressions::insert(&self.db, &progression).await?;
            }
        }

        debug!(
            report_id = %report_id,
            character = %character.name,
            zone_id = encounter.zone_id,
            is_kill = best.is_kill,
            fight_percentage = best.fight_percentage,
            "Progression recorded"
        );
        Ok(true)
    }
}
