//! Import queue
//!
//! A FIFO of pending report ids behind a single lock, shared between request
//! handlers (producers) and one [`ImportWorker`] (consumer). The worker pops
//! at most one report per tick and processes it to completion before the
//! next tick, so all storage writes happen on that one task.
//!
//! The lock only covers the pending list. Producers never wait on an import
//! in progress.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::services::fflogs_client::ReportFetcher;
use crate::services::sync_engine::{SyncEngine, SyncSummary};

/// Queue errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The report is already waiting in the queue
    #[error("Report {0} is already queued")]
    AlreadyQueued(String),
}

/// Observable queue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    /// Nothing pending, nothing running
    Idle,
    /// At least one report waiting, worker between reports
    Pending,
    /// Worker is importing a report
    Processing,
}

#[derive(Debug, Default)]
struct QueueInner {
    pending: VecDeque<String>,
    processing: Option<String>,
}

/// Pending report ids
#[derive(Debug, Default)]
pub struct ImportQueue {
    inner: Mutex<QueueInner>,
}

impl ImportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a report id unless it is already pending
    ///
    /// A report currently being processed or already imported is not
    /// rejected here; callers check the import ledger first.
    pub async fn enqueue(&self, report_id: &str) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().await;
        if inner.pending.iter().any(|id| id == report_id) {
            return Err(QueueError::AlreadyQueued(report_id.to_string()));
        }
        inner.pending.push_back(report_id.to_string());
        info!(
            report_id = %report_id,
            queue_len = inner.pending.len(),
            "Report added to import queue"
        );
        Ok(())
    }

    /// Take the oldest pending id and mark it as processing
    async fn begin_next(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let next = inner.pending.pop_front()?;
        inner.processing = Some(next.clone());
        Some(next)
    }

    async fn finish(&self) {
        self.inner.lock().await.processing = None;
    }

    pub async fn state(&self) -> QueueState {
        let inner = self.inner.lock().await;
        if inner.processing.is_some() {
            QueueState::Processing
        } else if inner.pending.is_empty() {
            QueueState::Idle
        } else {
            QueueState::Pending
        }
    }

    /// Snapshot of pending ids, oldest first
    pub async fn pending(&self) -> Vec<String> {
        self.inner.lock().await.pending.iter().cloned().collect()
    }

    /// Report currently being imported
    pub async fn processing(&self) -> Option<String> {
        self.inner.lock().await.processing.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Result of one worker step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Imported { report_id: String, summary: SyncSummary },
    AlreadyImported { report_id: String },
    FetchFailed { report_id: String, error: String },
    SyncFailed { report_id: String, error: String },
}

/// Single consumer of the import queue
pub struct ImportWorker {
    queue: Arc<ImportQueue>,
    fetcher: Arc<dyn ReportFetcher>,
    engine: SyncEngine,
    tick: Duration,
}

impl ImportWorker {
    pub fn new(
        queue: Arc<ImportQueue>,
        fetcher: Arc<dyn ReportFetcher>,
        engine: SyncEngine,
        tick: Duration,
    ) -> Self {
        Self {
            queue,
            fetcher,
            engine,
            tick,
        }
    }

    /// Run until `cancel` fires
    ///
    /// Cancellation is observed between ticks; a report already being
    /// imported always runs to completion.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(tick_ms = self.tick.as_millis() as u64, "Import worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            self.process_next().await;
        }

        info!("Import worker stopped");
    }

    /// Pop and import one report, if any is pending
    ///
    /// Failures are logged and the report is dropped without retry.
    pub async fn process_next(&self) -> Option<ProcessOutcome> {
        let report_id = self.queue.begin_next().await?;
        let outcome = self.import(report_id).await;
        self.queue.finish().await;
        Some(outcome)
    }

    async fn import(&self, report_id: String) -> ProcessOutcome {
        info!(report_id = %report_id, "Processing report");

        match self.engine.is_imported(&report_id).await {
            Ok(true) => {
                warn!(report_id = %report_id, "Report already imported, dropping");
                return ProcessOutcome::AlreadyImported { report_id };
            }
            Ok(false) => {}
            Err(e) => {
                error!(report_id = %report_id, error = %e, "Import ledger check failed");
                return ProcessOutcome::SyncFailed {
                    report_id,
                    error: e.to_string(),
                };
            }
        }

        let report = match self.fetcher.fetch_report(&report_id).await {
            Ok(report) => report,
            Err(e) => {
                error!(report_id = %report_id, error = %e, "Error fetching report");
                return ProcessOutcome::FetchFailed {
                    report_id,
                    error: e.to_string(),
                };
            }
        };

        match self.engine.handle_report(&report_id, &report).await {
            Ok(summary) => ProcessOutcome::Imported { report_id, summary },
            Err(e) => {
                error!(report_id = %report_id, error = %e, "Error importing report");
                ProcessOutcome::SyncFailed {
                    report_id,
                    error: e.to_string(),
                }
            }
        }
    }
}
