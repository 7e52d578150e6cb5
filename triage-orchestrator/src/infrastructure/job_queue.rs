use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::executor::AnalysisExecutor;
use crate::application::workflow::JobWorkflow;
use crate::domain::JobStatus;

/// Message delivered to the background worker pool when an analysis is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedAnalysisJob {
    pub job_id: Uuid,
    /// Bytes to analyze (canonical upload or surviving working copy)
    pub source_path: PathBuf,
}

/// Errors that can occur when enqueuing a job.
#[derive(thiserror::Error, Debug)]
pub enum JobQueueError {
    #[error("Job queue is full")]
    QueueFull,
    #[error("Job queue is closed")]
    Closed,
}

/// Capacity reserved in the queue; dropping it releases the slot.
pub struct QueueSlot(mpsc::OwnedPermit<QueuedAnalysisJob>);

impl QueueSlot {
    pub fn send(self, job: QueuedAnalysisJob) {
        self.0.send(job);
    }
}

/// Handle that allows request handlers to push jobs into the worker queue.
#[derive(Clone)]
pub struct JobQueueHandle {
    sender: mpsc::Sender<QueuedAnalysisJob>,
}

/// Receiving end consumed by [`spawn_job_worker_pool`].
pub type JobQueueReceiver = mpsc::Receiver<QueuedAnalysisJob>;

/// Bounded job queue.
pub fn job_queue(capacity: usize) -> (JobQueueHandle, JobQueueReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (JobQueueHandle { sender }, receiver)
}

impl JobQueueHandle {
    /// Reserve a slot without waiting.
    pub fn reserve(&self) -> Result<QueueSlot, JobQueueError> {
        self.sender
            .clone()
            .try_reserve_owned()
            .map(QueueSlot)
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => JobQueueError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => JobQueueError::Closed,
            })
    }

    /// Enqueue, waiting for capacity.
    pub async fn enqueue(&self, job: QueuedAnalysisJob) -> Result<(), JobQueueError> {
        self.sender.send(job).await.map_err(|_| {
            error!("Failed to enqueue job: worker pool is gone");
            JobQueueError::Closed
        })
    }
}

/// Shared dependencies required by the job workers.
#[derive(Clone)]
pub struct JobWorkerContext {
    pub executor: Arc<AnalysisExecutor>,
    pub workflow: Arc<JobWorkflow>,
}

/// Spawn a worker pool that consumes queued jobs and processes them in the background.
///
/// Each job runs in its own task so that a panic inside a run is observed
/// here and recorded as a failure instead of leaving the job `running`.
/// After `shutdown` fires no new job is taken, and the returned handle
/// resolves once every in-flight run has finished.
pub fn spawn_job_worker_pool(
    context: JobWorkerContext,
    mut receiver: JobQueueReceiver,
    max_concurrent_jobs: usize,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let concurrency = max_concurrent_jobs.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));

    tokio::spawn(async move {
        info!("Job worker pool started with concurrency: {}", concurrency);

        loop {
            // Wait for a permit before taking a job off the queue
            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(err) => {
                        error!(error = %err, "Failed to acquire concurrency permit for job processing");
                        break;
                    }
                },
            };

            let job = tokio::select! {
                _ = shutdown.cancelled() => break,
                job = receiver.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            let ctx = context.clone();
            tokio::spawn(async move {
                process_job(ctx, job).await;
                drop(permit);
            });
        }

        // Let in-flight runs finish before reporting the pool as stopped
        let in_flight = concurrency - semaphore.available_permits();
        if in_flight > 0 {
            info!(in_flight, "Waiting for running analysis jobs to finish");
        }
        if let Err(err) = semaphore.acquire_many(concurrency as u32).await {
            error!(error = %err, "Failed to drain running analysis jobs");
        }

        warn!("Job worker pool exiting");
    })
}

async fn process_job(ctx: JobWorkerContext, job: QueuedAnalysisJob) {
    let job_id = job.job_id;
    info!(job_id = %job_id, "Processing analysis job");

    let executor = ctx.executor.clone();
    let run = tokio::spawn(async move { executor.execute(job.job_id, &job.source_path).await });

    match run.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(job_id = %job_id, error = %e, "Background job processing failed");
            fail_aborted_job(&ctx, job_id, &e.to_string()).await;
        }
        Err(join_error) => {
            error!(job_id = %job_id, error = %join_error, "Analysis task aborted");
            fail_aborted_job(&ctx, job_id, &join_error.to_string()).await;
        }
    }
}

/// Move a job whose run died mid-flight, or whose final status could not be
/// persisted, to `failed`. The job is reloaded so the store's view decides.
async fn fail_aborted_job(ctx: &JobWorkerContext, job_id: Uuid, reason: &str) {
    let mut job = match ctx.workflow.get_job(job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => return,
        Err(e) => {
            error!(job_id = %job_id, error = %e, "Failed to load aborted job");
            return;
        }
    };

    if job.status == JobStatus::Pending
        && let Err(e) = ctx.workflow.start_job(&mut job).await
    {
        error!(job_id = %job_id, error = %e, "Failed to transition aborted job to Running");
        return;
    }

    if job.status == JobStatus::Running
        && let Err(e) = ctx.workflow.fail_job(&mut job, reason).await
    {
        error!(job_id = %job_id, error = %e, "Failed to transition aborted job to Failed");
    }
}
