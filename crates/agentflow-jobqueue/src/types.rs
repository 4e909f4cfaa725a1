//! Shared types for the ingestion job queue (spec §4.11), grounded on
//! `examples/original_source/backend/airbeeps/rag/job_queue.py`'s
//! `JobPriority`, `JobStats`, `RetryConfig`, and `QueuedJob`.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job priority level. Higher value runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobPriority(i32);

impl JobPriority {
    pub const LOW: JobPriority = JobPriority(1);
    pub const NORMAL: JobPriority = JobPriority(5);
    pub const HIGH: JobPriority = JobPriority(10);
    pub const URGENT: JobPriority = JobPriority(20);

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl Default for JobPriority {
    fn default() -> Self {
        JobPriority::NORMAL
    }
}

/// Exponential backoff configuration for failed jobs.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_secs(5), max_delay: Duration::from_secs(300), exponential_base: 2.0 }
    }
}

impl RetryConfig {
    /// Delay before the `attempt`-th retry (0-indexed), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self.base_delay.as_secs_f64() * self.exponential_base.powi(attempt as i32);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// A job waiting in the priority heap.
///
/// `seq` is a monotonically increasing enqueue counter, not present in the
/// ported source: `enqueued_at` alone can tie on fast clocks, which would
/// make the ordering between same-tick jobs nondeterministic. `seq` gives
/// the "ties by earlier enqueued_at" rule a strict total order to fall back
/// on without changing priority/timestamp semantics.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub priority: JobPriority,
    pub enqueued_at: DateTime<Utc>,
    pub job_id: Uuid,
    pub retry_count: u32,
    pub(crate) seq: u64,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: higher priority pops first, and among
        // equal priorities the earlier-enqueued (smaller seq) pops first.
        self.priority.cmp(&other.priority).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Queue statistics (spec §4.11).
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobStats {
    pub total_enqueued: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub total_cancelled: u64,
    pub total_retried: u64,
    pub currently_running: usize,
    pub currently_queued: usize,
    pub avg_execution_time_ms: f64,
    pub last_job_started: Option<DateTime<Utc>>,
    pub last_job_completed: Option<DateTime<Utc>>,
}

impl JobStats {
    pub fn success_rate(&self) -> f64 {
        let denom = (self.total_completed + self.total_failed).max(1);
        self.total_completed as f64 / denom as f64 * 100.0
    }
}

/// How a job's execution concluded.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Succeeded,
    Failed(String),
    Cancelled,
}

/// Cooperative cancellation flag handed to a running job.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::SeqCst)
    }

    pub(crate) fn request_cancel(&self) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }
}

/// Executes the body of a single job. Implementations are the in-process
/// equivalent of the ported `IngestionRunner`; this crate has no
/// database-backed job model of its own, so the outcome is reported
/// directly rather than read back from a persisted row.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn run(&self, job_id: Uuid, cancel: CancelHandle) -> JobOutcome;
}
