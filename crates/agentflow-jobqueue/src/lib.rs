//! Priority job queue for background ingestion work (spec §4.11): a
//! priority heap, a single dispatch worker, exponential-backoff retries,
//! and cooperative cancellation, behind a backend-agnostic trait.

pub mod queue;
pub mod types;

pub use queue::{InProcessJobQueue, JobQueueBackend};
pub use types::{CancelHandle, JobExecutor, JobOutcome, JobPriority, JobStats, QueuedJob, RetryConfig};
