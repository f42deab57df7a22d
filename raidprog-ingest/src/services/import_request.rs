//! Import request handling
//!
//! The two ways a report enters the system:
//! - [`submit`]: throttled, deduplicated, queued for the worker (HTTP)
//! - [`import_now`]: fetched and synchronized immediately (CLI)
//!
//! Both reject reports already in the import ledger before doing any work.

use thiserror::Error;

use crate::services::fflogs_client::{FetchError, ReportFetcher};
use crate::services::import_queue::{ImportQueue, QueueError};
use crate::services::rate_limiter::ClientRateLimiter;
use crate::services::report_id::parse_report_id;
use crate::services::sync_engine::{SyncEngine, SyncError, SyncSummary};

/// Import request errors
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("FFLogs report URL not provided or invalid")]
    InvalidReportId,

    #[error("Client address could not be determined")]
    InvalidClient,

    #[error("Too many import requests, please wait a little")]
    RateLimited,

    #[error("Report {0} has already been processed")]
    AlreadyImported(String),

    #[error("Report {0} is already being processed")]
    AlreadyQueued(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl From<QueueError> for ImportError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::AlreadyQueued(id) => ImportError::AlreadyQueued(id),
        }
    }
}

/// Validate an import request from `client` and queue it
///
/// Returns the parsed report id.
pub async fn submit(
    limiter: &ClientRateLimiter,
    queue: &ImportQueue,
    engine: &SyncEngine,
    client: &str,
    input: &str,
) -> Result<String, ImportError> {
    if client.trim().is_empty() {
        return Err(ImportError::InvalidClient);
    }
    if !limiter.check(client) {
        tracing::debug!(client = %client, "Import request rate limited");
        return Err(ImportError::RateLimited);
    }

    let report_id = parse_report_id(input).ok_or(ImportError::InvalidReportId)?;

    if engine.is_imported(&report_id).await? {
        return Err(ImportError::AlreadyImported(report_id));
    }

    queue.enqueue(&report_id).await?;
    Ok(report_id)
}

/// Fetch and synchronize a report without going through the queue
pub async fn import_now(
    fetcher: &dyn ReportFetcher,
    engine: &SyncEngine,
    input: &str,
) -> Result<(String, SyncSummary), ImportError> {
    let report_id = parse_report_id(input).ok_or(ImportError::InvalidReportId)?;

    if engine.is_imported(&report_id).await? {
        return Err(ImportError::AlreadyImported(report_id));
    }

    let report = fetcher.fetch_report(&report_id).await?;
    let summary = engine.handle_report(&report_id, &report).await?;
    Ok((report_id, summary))
}
