//! `ingest` command: enqueue one job on the background job queue (spec
//! §4.11 / SPEC_FULL.md §16). Grounded on `job_queue.py`'s `IngestionRunner`
//! shape, minus the document-pipeline body (out of scope per spec §1) — the
//! executor here just checks the file exists and reports success.

use std::path::PathBuf;
use std::time::Duration;

use agentflow_jobqueue::{CancelHandle, InProcessJobQueue, JobExecutor, JobOutcome, JobPriority, JobQueueBackend, RetryConfig};
use async_trait::async_trait;
use uuid::Uuid;

struct FileIngestExecutor {
    path: PathBuf,
}

#[async_trait]
impl JobExecutor for FileIngestExecutor {
    async fn run(&self, job_id: Uuid, cancel: CancelHandle) -> JobOutcome {
        if cancel.is_cancelled() {
            return JobOutcome::Cancelled;
        }
        tracing::info!(job_id = %job_id, path = %self.path.display(), "ingesting document");
        if !self.path.exists() {
            return JobOutcome::Failed(format!("no such file: {}", self.path.display()));
        }
        JobOutcome::Succeeded
    }
}

fn parse_priority(raw: &str) -> anyhow::Result<JobPriority> {
    match raw.to_lowercase().as_str() {
        "low" => Ok(JobPriority::LOW),
        "normal" => Ok(JobPriority::NORMAL),
        "high" => Ok(JobPriority::HIGH),
        "urgent" => Ok(JobPriority::URGENT),
        other => anyhow::bail!("unknown priority '{other}' (expected low, normal, high, or urgent)"),
    }
}

pub async fn run(path: String, priority: String) -> anyhow::Result<()> {
    let priority = parse_priority(&priority)?;
    let executor = std::sync::Arc::new(FileIngestExecutor { path: PathBuf::from(&path) });
    let queue = InProcessJobQueue::new(executor, 1, RetryConfig::default());

    let job_id = Uuid::new_v4();
    let accepted = queue.enqueue(job_id, priority).await;
    if !accepted {
        anyhow::bail!("job {job_id} was already queued or running");
    }
    println!("enqueued {path} as job {job_id} (priority {:?})", priority.value());

    for _ in 0..100 {
        let stats = queue.get_stats().await;
        if stats.currently_running == 0 && stats.currently_queued == 0 {
            println!(
                "done: {} completed, {} failed (success rate {:.1}%)",
                stats.total_completed,
                stats.total_failed,
                stats.success_rate()
            );
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    queue.shutdown(Duration::from_secs(2)).await;
    Ok(())
}
