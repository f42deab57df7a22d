//! Ingestion pipeline services

pub mod extractor;
pub mod fflogs_client;
pub mod identity;
pub mod import_queue;
pub mod import_request;
pub mod improvement;
pub mod rate_limiter;
pub mod report_id;
pub mod sync_engine;
pub mod validity;

pub use fflogs_client::{FFLogsClient, FetchError, ReportFetcher};
pub use import_queue::{ImportQueue, ImportWorker, ProcessOutcome, QueueError, QueueState};
pub use import_request::ImportError;
pub use rate_limiter::ClientRateLimiter;
pub use sync_engine::{PublicIdSource, SyncEngine, SyncError, SyncSummary};
