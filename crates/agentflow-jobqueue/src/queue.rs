//! In-process job queue backend (spec §4.11), grounded on
//! `examples/original_source/backend/airbeeps/rag/job_queue.py`'s
//! `InProcessJobQueue`: a priority heap guarded by a single worker task,
//! expressed with `tokio::sync::Mutex` + `Notify` rather than
//! `asyncio.Lock` + `Event`, following the semaphore-bounded-dispatch idiom
//! `agentflow-executor`'s `ParallelToolExecutor` already uses for this
//! corpus.

use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::types::{CancelHandle, JobExecutor, JobOutcome, JobPriority, JobStats, QueuedJob, RetryConfig};

/// Common interface every job queue backend exposes (spec §4.11): the
/// in-process heap built here, or a distributed broker-backed backend
/// (not implemented, see DESIGN.md).
#[async_trait]
pub trait JobQueueBackend: Send + Sync {
    async fn enqueue(&self, job_id: Uuid, priority: JobPriority) -> bool;
    async fn cancel(&self, job_id: Uuid) -> bool;
    async fn is_running(&self, job_id: Uuid) -> bool;
    async fn is_queued(&self, job_id: Uuid) -> bool;
    async fn get_stats(&self) -> JobStats;
    async fn retry_failed(&self, job_id: Uuid) -> bool;
    async fn shutdown(&self, timeout: Duration);
}

#[derive(Default)]
struct State {
    running: HashMap<Uuid, JoinHandle<()>>,
    pending: BinaryHeap<QueuedJob>,
    retry_counts: HashMap<Uuid, u32>,
    cancel_flags: HashMap<Uuid, CancelHandle>,
    stats: JobStats,
    execution_times: VecDeque<f64>,
    next_seq: u64,
    shutdown_requested: bool,
    retry_handles: Vec<JoinHandle<()>>,
}

/// Priority job queue running jobs as tokio tasks in this process.
/// Suitable for development and single-server deployments.
pub struct InProcessJobQueue<E: JobExecutor + 'static> {
    state: Arc<Mutex<State>>,
    notify: Arc<Notify>,
    executor: Arc<E>,
    max_concurrent: usize,
    retry_config: RetryConfig,
    worker_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<E: JobExecutor + 'static> InProcessJobQueue<E> {
    pub fn new(executor: Arc<E>, max_concurrent: usize, retry_config: RetryConfig) -> Arc<Self> {
        let queue = Arc::new(Self {
            state: Arc::new(Mutex::new(State::default())),
            notify: Arc::new(Notify::new()),
            executor,
            max_concurrent,
            retry_config,
            worker_handle: std::sync::Mutex::new(None),
        });

        let worker_queue = queue.clone();
        let worker = tokio::spawn(async move { worker_queue.run_worker().await });
        *queue.worker_handle.lock().expect("worker handle mutex poisoned") = Some(worker);
        queue
    }

    async fn run_worker(self: Arc<Self>) {
        loop {
            let next = {
                let mut state = self.state.lock().await;
                if state.shutdown_requested {
                    return;
                }
                if state.running.len() < self.max_concurrent {
                    state.pending.pop()
                } else {
                    None
                }
            };

            match next {
                Some(job) => self.start_job(job).await,
                None => {
                    let notified = self.notify.notified();
                    tokio::select! {
                        _ = notified => {}
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    }
                }
            }
        }
    }

    async fn start_job(self: &Arc<Self>, job: QueuedJob) {
        let job_id = job.job_id;
        let cancel = CancelHandle::new();
        let queue = self.clone();
        let cancel_for_task = cancel.clone();
        let handle = tokio::spawn(async move { queue.execute_job(job, cancel_for_task).await });

        let mut state = self.state.lock().await;
        state.running.insert(job_id, handle);
        state.cancel_flags.insert(job_id, cancel);
        state.stats.currently_running = state.running.len();
        state.stats.currently_queued = state.pending.len();
        state.stats.last_job_started = Some(Utc::now());
    }

    async fn execute_job(self: Arc<Self>, job: QueuedJob, cancel: CancelHandle) {
        let job_id = job.job_id;
        let start = Instant::now();
        let outcome = self.executor.run(job_id, cancel).await;
        let execution_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut state = self.state.lock().await;
        state.running.remove(&job_id);
        state.cancel_flags.remove(&job_id);
        state.stats.currently_running = state.running.len();
        state.stats.last_job_completed = Some(Utc::now());

        state.execution_times.push_back(execution_ms);
        if state.execution_times.len() > 100 {
            state.execution_times.pop_front();
        }
        let sum: f64 = state.execution_times.iter().sum();
        state.stats.avg_execution_time_ms = sum / state.execution_times.len() as f64;

        match outcome {
            JobOutcome::Succeeded => {
                state.stats.total_completed += 1;
                state.retry_counts.remove(&job_id);
                tracing::info!(%job_id, "job completed successfully");
            }
            JobOutcome::Cancelled => {
                state.stats.total_cancelled += 1;
                state.retry_counts.remove(&job_id);
                tracing::info!(%job_id, "job was cancelled");
            }
            JobOutcome::Failed(err) => {
                state.stats.total_failed += 1;
                let retry_count = *state.retry_counts.get(&job_id).unwrap_or(&0);

                if retry_count < self.retry_config.max_retries {
                    let delay = self.retry_config.delay_for(retry_count);
                    state.retry_counts.insert(job_id, retry_count + 1);
                    state.stats.total_retried += 1;
                    tracing::info!(%job_id, attempt = retry_count + 1, max = self.retry_config.max_retries, ?delay, error = %err, "scheduling job retry");

                    let queue = self.clone();
                    let priority = job.priority;
                    // Tracked so `shutdown` can await the retry sleep rather
                    // than dropping it mid-wait.
                    let retry_handle = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        queue.enqueue(job_id, priority).await;
                    });
                    state.retry_handles.retain(|h| !h.is_finished());
                    state.retry_handles.push(retry_handle);
                } else {
                    tracing::warn!(%job_id, retry_count, error = %err, "job failed after max retries, giving up");
                    state.retry_counts.remove(&job_id);
                }
            }
        }

        state.stats.currently_queued = state.pending.len();
        drop(state);
        self.notify.notify_one();
    }
}

#[async_trait]
impl<E: JobExecutor + 'static> JobQueueBackend for InProcessJobQueue<E> {
    async fn enqueue(&self, job_id: Uuid, priority: JobPriority) -> bool {
        let mut state = self.state.lock().await;

        if state.running.contains_key(&job_id) {
            tracing::warn!(%job_id, "job is already running");
            return false;
        }
        if state.pending.iter().any(|j| j.job_id == job_id) {
            tracing::warn!(%job_id, "job is already queued");
            return false;
        }

        let retry_count = *state.retry_counts.get(&job_id).unwrap_or(&0);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.push(QueuedJob { priority, enqueued_at: Utc::now(), job_id, retry_count, seq });
        state.stats.total_enqueued += 1;
        state.stats.currently_queued = state.pending.len();
        tracing::info!(%job_id, priority = priority.value(), "enqueued job");

        drop(state);
        self.notify.notify_one();
        true
    }

    async fn cancel(&self, job_id: Uuid) -> bool {
        let mut state = self.state.lock().await;

        if let Some(flag) = state.cancel_flags.get(&job_id) {
            flag.request_cancel();
            tracing::info!(%job_id, "cancellation requested for running job");
            return true;
        }

        let before = state.pending.len();
        let remaining: BinaryHeap<QueuedJob> = state.pending.drain().filter(|j| j.job_id != job_id).collect();
        let found = remaining.len() < before;
        state.pending = remaining;

        if found {
            state.stats.currently_queued = state.pending.len();
            state.stats.total_cancelled += 1;
            tracing::info!(%job_id, "removed queued job");
            true
        } else {
            tracing::warn!(%job_id, "cannot cancel: not running or queued");
            false
        }
    }

    async fn is_running(&self, job_id: Uuid) -> bool {
        self.state.lock().await.running.contains_key(&job_id)
    }

    async fn is_queued(&self, job_id: Uuid) -> bool {
        self.state.lock().await.pending.iter().any(|j| j.job_id == job_id)
    }

    async fn get_stats(&self) -> JobStats {
        let state = self.state.lock().await;
        let mut stats = state.stats.clone();
        stats.currently_running = state.running.len();
        stats.currently_queued = state.pending.len();
        stats
    }

    async fn retry_failed(&self, job_id: Uuid) -> bool {
        {
            let mut state = self.state.lock().await;
            state.retry_counts.insert(job_id, 0);
        }
        self.enqueue(job_id, JobPriority::HIGH).await
    }

    async fn shutdown(&self, timeout: Duration) {
        {
            let mut state = self.state.lock().await;
            state.shutdown_requested = true;
        }
        self.notify.notify_waiters();

        let mut handles: Vec<JoinHandle<()>> = Vec::new();
        {
            let mut state = self.state.lock().await;
            for (_, handle) in state.running.drain() {
                handles.push(handle);
            }
            handles.append(&mut state.retry_handles);
        }
        if let Some(worker) = self.worker_handle.lock().expect("worker handle mutex poisoned").take() {
            handles.push(worker);
        }

        if handles.is_empty() {
            return;
        }

        tracing::info!(count = handles.len(), "waiting for in-flight jobs to complete");
        let abort_handles: Vec<tokio::task::AbortHandle> = handles.iter().map(|h| h.abort_handle()).collect();

        if tokio::time::timeout(timeout, futures::future::join_all(handles)).await.is_err() {
            tracing::warn!("shutdown timeout reached, cancelling remaining jobs");
            for handle in abort_handles {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingExecutor {
        calls: Arc<AtomicUsize>,
        fail_times: usize,
    }

    #[async_trait]
    impl JobExecutor for CountingExecutor {
        async fn run(&self, _job_id: Uuid, _cancel: CancelHandle) -> JobOutcome {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                JobOutcome::Failed("transient error".to_string())
            } else {
                JobOutcome::Succeeded
            }
        }
    }

    struct SlowExecutor;

    #[async_trait]
    impl JobExecutor for SlowExecutor {
        async fn run(&self, _job_id: Uuid, cancel: CancelHandle) -> JobOutcome {
            for _ in 0..50 {
                if cancel.is_cancelled() {
                    return JobOutcome::Cancelled;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            JobOutcome::Succeeded
        }
    }

    #[tokio::test]
    async fn enqueue_and_complete_updates_stats() {
        let executor = Arc::new(CountingExecutor { calls: Arc::new(AtomicUsize::new(0)), fail_times: 0 });
        let queue = InProcessJobQueue::new(executor, 2, RetryConfig::default());

        let job_id = Uuid::new_v4();
        assert!(queue.enqueue(job_id, JobPriority::NORMAL).await);

        for _ in 0..50 {
            if queue.get_stats().await.total_completed == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let stats = queue.get_stats().await;
        assert_eq!(stats.total_completed, 1);
        assert_eq!(stats.total_enqueued, 1);
        assert_eq!(stats.currently_running, 0);
    }

    #[tokio::test]
    async fn duplicate_enqueue_is_rejected() {
        let executor = Arc::new(SlowExecutor);
        let queue = InProcessJobQueue::new(executor, 1, RetryConfig::default());

        let job_id = Uuid::new_v4();
        assert!(queue.enqueue(job_id, JobPriority::NORMAL).await);
        assert!(!queue.enqueue(job_id, JobPriority::HIGH).await);
    }

    #[tokio::test]
    async fn cancel_running_job_is_observed_by_executor() {
        let executor = Arc::new(SlowExecutor);
        let queue = InProcessJobQueue::new(executor, 1, RetryConfig::default());

        let job_id = Uuid::new_v4();
        queue.enqueue(job_id, JobPriority::NORMAL).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(queue.is_running(job_id).await);

        assert!(queue.cancel(job_id).await);

        for _ in 0..50 {
            if queue.get_stats().await.total_cancelled == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(queue.get_stats().await.total_cancelled, 1);
    }

    #[tokio::test]
    async fn cancel_queued_job_removes_it_without_running() {
        let executor = Arc::new(SlowExecutor);
        let queue = InProcessJobQueue::new(executor, 1, RetryConfig::default());

        let blocker = Uuid::new_v4();
        queue.enqueue(blocker, JobPriority::NORMAL).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let queued = Uuid::new_v4();
        queue.enqueue(queued, JobPriority::NORMAL).await;
        assert!(queue.is_queued(queued).await);

        assert!(queue.cancel(queued).await);
        assert!(!queue.is_queued(queued).await);
        assert_eq!(queue.get_stats().await.total_cancelled, 1);

        queue.cancel(blocker).await;
    }

    #[tokio::test]
    async fn failed_job_is_retried_until_success() {
        let executor = Arc::new(CountingExecutor { calls: Arc::new(AtomicUsize::new(0)), fail_times: 2 });
        let retry_config = RetryConfig { max_retries: 3, base_delay: Duration::from_millis(5), max_delay: Duration::from_millis(20), exponential_base: 2.0 };
        let queue = InProcessJobQueue::new(executor, 2, retry_config);

        let job_id = Uuid::new_v4();
        queue.enqueue(job_id, JobPriority::NORMAL).await;

        for _ in 0..200 {
            if queue.get_stats().await.total_completed == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let stats = queue.get_stats().await;
        assert_eq!(stats.total_completed, 1);
        assert_eq!(stats.total_retried, 2);
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_jobs() {
        let executor = Arc::new(CountingExecutor { calls: Arc::new(AtomicUsize::new(0)), fail_times: 0 });
        let queue = InProcessJobQueue::new(executor, 2, RetryConfig::default());

        queue.enqueue(Uuid::new_v4(), JobPriority::NORMAL).await;
        queue.shutdown(Duration::from_secs(5)).await;

        assert_eq!(queue.get_stats().await.total_completed, 1);
    }
}
