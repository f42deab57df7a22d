//! Character lookup handlers
//!
//! GET /search, GET /characters/:public_id

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use raidprog_common::public_id;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{group_for_display, Character, DisplayEncounterGroup, ProgressionEntry};
use crate::AppState;

/// Maximum search results returned
const SEARCH_LIMIT: i64 = 50;

/// GET /search query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub n: String,
}

/// Search result entry
#[derive(Debug, Serialize)]
pub struct CharacterSummary {
    #[serde(flatten)]
    pub character: Character,
    pub job_abbreviation: Option<&'static str>,
}

impl From<Character> for CharacterSummary {
    fn from(character: Character) -> Self {
        let job_abbreviation = character.job_abbreviation();
        Self {
            character,
            job_abbreviation,
        }
    }
}

/// GET /characters/:public_id query
#[derive(Debug, Default, Deserialize)]
pub struct CharacterQuery {
    /// Include progression on encounters outside high-end content
    #[serde(default)]
    pub all: bool,
}

/// GET /characters/:public_id response
#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    pub character: CharacterSummary,
    pub progression: Vec<ProgressionEntry>,
    pub encounter_groups: Vec<DisplayEncounterGroup>,
}

/// GET /search?n=<name fragment>
pub async fn search_characters(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<CharacterSummary>>> {
    let fragment = query.n.trim();
    if fragment.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let characters = db::characters::search_by_name(&state.db, fragment, SEARCH_LIMIT).await?;
    Ok(Json(characters.into_iter().map(CharacterSummary::from).collect()))
}

/// GET /characters/:public_id
pub async fn get_character(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<CharacterQuery>,
) -> ApiResult<Json<CharacterResponse>> {
    let id = public_id::normalize(&raw_id);
    if !public_id::is_well_formed(&id) {
        return Err(ApiError::NotFound(format!("Character: {}", raw_id)));
    }

    let character = db::characters::find_by_public_id(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Character: {}", id)))?;

    let mut progression = db::progressions::best_for_character(&state.db, character.id).await?;
    if !query.all {
        progression.retain(|entry| entry.encounter.is_displayable());
    }

    let encounters = db::encounters::list_all(&state.db).await?;
    let encounter_groups = group_for_display(&encounters, &state.display_categories);

    Ok(Json(CharacterResponse {
        character: character.into(),
        progression,
        encounter_groups,
    }))
}

/// Build character routes
pub fn character_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_characters))
        .route("/characters/:public_id", get(get_character))
}
