//! raidprog-ingest library interface
//!
//! Report ingestion pipeline (identity hashing, validity filtering, best
//! attempt extraction, improvement policy, sync engine, import queue) plus the
//! SQLite store, FFLogs client and JSON HTTP API around it.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use raidprog_common::config::DisplayCategory;
use sqlx::SqlitePool;

use crate::services::{ClientRateLimiter, ImportQueue, SyncEngine};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read side for handlers)
    pub db: SqlitePool,
    /// Sync engine, used by handlers only for import ledger checks
    pub engine: SyncEngine,
    /// Pending reports, shared with the import worker
    pub queue: Arc<ImportQueue>,
    /// Per-client import throttling
    pub limiter: Arc<ClientRateLimiter>,
    /// Encounter groupings for character pages
    pub display_categories: Arc<Vec<DisplayCategory>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        queue: Arc<ImportQueue>,
        limiter: ClientRateLimiter,
        display_categories: Vec<DisplayCategory>,
    ) -> Self {
        Self {
            engine: SyncEngine::new(db.clone()),
            db,
            queue,
            limiter: Arc::new(limiter),
            display_categories: Arc::new(display_categories),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::import_routes())
        .merge(api::character_routes())
        .merge(api::health_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
