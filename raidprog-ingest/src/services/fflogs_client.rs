//! FFLogs API client
//!
//! Fetches the "report fights" document of the FFLogs v1 API and maps it into
//! a [`RawReport`]. The worker only depends on the [`ReportFetcher`] trait.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Attempt, RawReport, ReportCharacter};

const USER_AGENT: &str = concat!("raidprog/", env!("CARGO_PKG_VERSION"));

/// Report fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("API key rejected")]
    Unauthorized,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of raw reports
#[async_trait]
pub trait ReportFetcher: Send + Sync {
    async fn fetch_report(&self, report_id: &str) -> Result<RawReport, FetchError>;
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FightsResponse {
    start: i64,
    #[serde(default)]
    game_version: i64,
    #[serde(default)]
    fights: Vec<Fight>,
    #[serde(default)]
    friendlies: Vec<Friendly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fight {
    id: i64,
    #[serde(default)]
    boss: i64,
    #[serde(rename = "start_time")]
    start_time: i64,
    #[serde(rename = "end_time")]
    end_time: i64,
    #[serde(rename = "zoneID", default)]
    zone_id: i64,
    #[serde(default)]
    zone_name: String,
    difficulty: Option<i64>,
    kill: Option<bool>,
    fight_percentage: Option<i64>,
    boss_percentage: Option<i64>,
    last_phase_for_percentage_display: Option<i64>,
    has_echo: Option<bool>,
    standard_composition: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Friendly {
    #[serde(default)]
    name: String,
    #[serde(default)]
    server: Option<String>,
    #[serde(rename = "type", default)]
    job: String,
    #[serde(default)]
    fights: Vec<FriendlyFight>,
}

#[derive(Debug, Deserialize)]
struct FriendlyFight {
    id: i64,
}

impl From<FightsResponse> for RawReport {
    fn from(response: FightsResponse) -> Self {
        RawReport {
            start: response.start,
            game_version: response.game_version,
            attempts: response
                .fights
                .into_iter()
                .map(|f| Attempt {
                    id: f.id,
                    zone_id: f.zone_id,
                    zone_name: f.zone_name,
                    boss_id: f.boss,
                    difficulty: f.difficulty,
                    start_time: f.start_time,
                    end_time: f.end_time,
                    kill: f.kill,
                    fight_percentage: f.fight_percentage,
                    boss_percentage: f.boss_percentage,
                    last_phase: f.last_phase_for_percentage_display,
                    has_echo: f.has_echo,
                    standard_composition: f.standard_composition,
                })
                .collect(),
            characters: response
                .friendlies
                .into_iter()
                .map(|f| ReportCharacter {
                    name: f.name,
                    server: f.server.unwrap_or_default(),
                    job: f.job,
                    attempt_ids: f.fights.into_iter().map(|fight| fight.id).collect(),
                })
                .collect(),
        }
    }
}

/// Parse a report fights document
pub fn parse_fights(body: &str) -> Result<RawReport, FetchError> {
    let response: FightsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(response.into())
}

// ============================================================================
// Client
// ============================================================================

/// FFLogs v1 API client
pub struct FFLogsClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FFLogsClient {
    /// Build a client; `timeout` bounds each fetch so a hung request cannot
    /// stall the import worker indefinitely
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ReportFetcher for FFLogsClient {
    async fn fetch_report(&self, report_id: &str) -> Result<RawReport, FetchError> {
        let url = format!("{}/report/fights/{}", self.base_url, report_id);
        tracing::debug!(report_id = %report_id, url = %url, "Querying FFLogs API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(report_id.to_string()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::Api(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;
        let report = parse_fights(&body)?;

        tracing::info!(
            report_id = %report_id,
            attempts = report.attempts.len(),
            characters = report.characters.len(),
            "Retrieved report from FFLogs"
        );

        Ok(report)
    }
}
