//! Job Orchestrator - submit and restart analyses without blocking the caller

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::workflow::{JobWorkflow, WorkflowError};
use crate::domain::{AnalysisJob, AnalysisKind, JobStatus};
use crate::infrastructure::job_queue::{JobQueueError, JobQueueHandle, QueuedAnalysisJob};
use crate::infrastructure::job_store::{JobStore, JobStoreError};
use crate::infrastructure::storage::{Storage, sanitize_filename};

const INTERACTIVE_UNAVAILABLE: &str = "Interactive mode is not available in this version";

/// Request-level errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Analysis not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid filename: '{0}'")]
    InvalidFilename(String),

    #[error("Analysis {id} is already {status}")]
    JobBusy { id: Uuid, status: JobStatus },

    #[error("Original file for analysis {0} is no longer available")]
    SourceUnavailable(Uuid),

    #[error("Analysis queue is full, retry later")]
    QueueFull,

    #[error("Analysis {0} is not an interactive session")]
    NotInteractive(Uuid),

    #[error("No session information for analysis {0}")]
    NoSessionInfo(Uuid),

    #[error("Worker pool is not running")]
    QueueClosed,

    #[error("Persistence error: {0}")]
    Store(#[from] JobStoreError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<JobQueueError> for OrchestratorError {
    fn from(e: JobQueueError) -> Self {
        match e {
            JobQueueError::QueueFull => Self::QueueFull,
            JobQueueError::Closed => Self::QueueClosed,
        }
    }
}

/// Placeholder session details of an interactive job
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub message: String,
}

/// What startup recovery did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub failed: usize,
    pub requeued: usize,
}

pub struct JobOrchestrator {
    job_store: Arc<dyn JobStore>,
    workflow: Arc<JobWorkflow>,
    storage: Arc<Storage>,
    queue: JobQueueHandle,
    /// Serializes restarts so one finished job is never queued twice
    restart_lock: Mutex<()>,
}

impl JobOrchestrator {
    pub fn new(workflow: Arc<JobWorkflow>, storage: Arc<Storage>, queue: JobQueueHandle) -> Self {
        Self {
            job_store: workflow.job_store().clone(),
            workflow,
            storage,
            queue,
            restart_lock: Mutex::new(()),
        }
    }

    /// Register a new analysis and schedule it. Returns the `pending` job.
    pub async fn submit(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<AnalysisJob, OrchestratorError> {
        let filename = sanitize_filename(filename)
            .ok_or_else(|| OrchestratorError::InvalidFilename(filename.to_string()))?;

        // Capacity first, so a full queue leaves no trace in the store
        let slot = self.queue.reserve()?;

        let job = AnalysisJob::new(filename);
        let source_path = self
            .storage
            .store_upload(job.id, &job.filename, bytes)
            .await?;
        self.job_store.create(&job).await?;

        slot.send(QueuedAnalysisJob {
            job_id: job.id,
            source_path,
        });

        info!(job_id = %job.id, filename = %job.filename, size = bytes.len(), "Analysis submitted");
        Ok(job)
    }

    /// Re-arm a finished job and run it again under the same id.
    pub async fn restart(&self, id: Uuid) -> Result<AnalysisJob, OrchestratorError> {
        let _guard = self.restart_lock.lock().await;
        let mut job = self.get(id).await?;

        if job.is_busy() {
            return Err(OrchestratorError::JobBusy {
                id,
                status: job.status,
            });
        }

        let source_path = self
            .storage
            .locate_source(id, &job.filename)
            .await
            .ok_or(OrchestratorError::SourceUnavailable(id))?;

        let slot = self.queue.reserve()?;
        self.workflow.rearm_job(&mut job).await?;

        slot.send(QueuedAnalysisJob {
            job_id: id,
            source_path,
        });

        info!(job_id = %id, "Analysis restarted");
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<AnalysisJob, OrchestratorError> {
        self.job_store
            .get(id)
            .await?
            .ok_or(OrchestratorError::NotFound(id))
    }

    /// All analyses, most recent first
    pub async fn list(&self) -> Result<Vec<AnalysisJob>, OrchestratorError> {
        Ok(self.job_store.list().await?)
    }

    /// Create a placeholder interactive job, completed immediately.
    pub async fn start_interactive_session(&self) -> Result<AnalysisJob, OrchestratorError> {
        let mut job = AnalysisJob::interactive();
        self.job_store.create(&job).await?;

        self.workflow.start_job(&mut job).await?;
        self.workflow
            .record_execution_info(&mut job, json!({ "message": INTERACTIVE_UNAVAILABLE }))
            .await?;
        self.workflow.complete_job(&mut job).await?;

        info!(job_id = %job.id, "Interactive session placeholder created");
        Ok(job)
    }

    pub async fn session_info(&self, id: Uuid) -> Result<SessionInfo, OrchestratorError> {
        let job = self.get(id).await?;

        if job.analysis_kind != AnalysisKind::Interactive {
            return Err(OrchestratorError::NotInteractive(id));
        }

        let message = job
            .execution_info
            .as_ref()
            .and_then(|info| info.get("message"))
            .and_then(|m| m.as_str())
            .ok_or(OrchestratorError::NoSessionInfo(id))?;

        Ok(SessionInfo {
            session_id: id,
            message: message.to_string(),
        })
    }

    /// Reconcile jobs left behind by a previous process.
    ///
    /// `running` jobs lost their executor and become `failed`; `pending` jobs
    /// are queued again when their bytes still exist. The worker pool must be
    /// running, since re-queuing waits for capacity.
    pub async fn recover_interrupted(&self) -> Result<RecoveryReport, OrchestratorError> {
        let mut report = RecoveryReport::default();

        for mut job in self.job_store.list_by_status(JobStatus::Running).await? {
            self.workflow
                .fail_job(&mut job, "Interrupted by service restart")
                .await?;
            report.failed += 1;
        }

        for mut job in self.job_store.list_by_status(JobStatus::Pending).await? {
            match self.storage.locate_source(job.id, &job.filename).await {
                Some(source_path) => {
                    self.queue
                        .enqueue(QueuedAnalysisJob {
                            job_id: job.id,
                            source_path,
                        })
                        .await?;
                    report.requeued += 1;
                }
                None => {
                    warn!(job_id = %job.id, "Pending job has no source bytes, failing it");
                    self.workflow.start_job(&mut job).await?;
                    self.workflow
                        .fail_job(&mut job, "Original file is no longer available")
                        .await?;
                    report.failed += 1;
                }
            }
        }

        if report != RecoveryReport::default() {
            info!(
                failed = report.failed,
                requeued = report.requeued,
                "Recovered interrupted analyses"
            );
        }
        Ok(report)
    }
}
