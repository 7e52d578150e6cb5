//! Job Workflow - centralised state-machine controller for analysis jobs.
//!
//! Every status transition goes through [`JobWorkflow`], which validates it
//! against the state machine on [`JobStatus`], writes it to the
//! [`JobStore`] and only then returns.
//!
//! ```text
//! Orchestrator        Worker            JobWorkflow          JobStore
//!     │                  │                   │                   │
//!     ├─ create ─────────┼───────────────────┼──────────────────►│ pending
//!     │                  ├─ start_job() ────►│── update_status ─►│ running
//!     │                  ├─ record_*() ─────►│── set_* ─────────►│
//!     │                  ├─ complete_job() ─►│── update_status ─►│ completed
//!     │                  │   or fail_job()   │                   │ failed
//!     ├─ rearm_job() ────┼──────────────────►│── update_status ─►│ pending
//! ```

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{AnalysisJob, JobStatus, JobTransitionError};
use crate::infrastructure::job_store::{JobStore, JobStoreError};

/// Errors from the workflow layer.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid state transition: {0}")]
    InvalidTransition(#[from] JobTransitionError),

    #[error("Persistence error: {0}")]
    Store(#[from] JobStoreError),
}

/// Centralised job lifecycle controller.
#[derive(Clone)]
pub struct JobWorkflow {
    job_store: Arc<dyn JobStore>,
}

impl JobWorkflow {
    pub fn new(job_store: Arc<dyn JobStore>) -> Self {
        Self { job_store }
    }

    pub fn job_store(&self) -> &Arc<dyn JobStore> {
        &self.job_store
    }

    // ── Transition helpers ───────────────────────────────────────────

    /// Transition a job to [`JobStatus::Running`] and persist.
    pub async fn start_job(&self, job: &mut AnalysisJob) -> Result<(), WorkflowError> {
        self.transition(job, JobStatus::Running).await?;
        info!(job_id = %job.id, "Job transitioned to Running");
        Ok(())
    }

    /// Transition a job to [`JobStatus::Completed`] and persist.
    pub async fn complete_job(&self, job: &mut AnalysisJob) -> Result<(), WorkflowError> {
        self.transition(job, JobStatus::Completed).await?;
        info!(job_id = %job.id, "Job transitioned to Completed");
        Ok(())
    }

    /// Transition a job to [`JobStatus::Failed`] and persist.
    pub async fn fail_job(&self, job: &mut AnalysisJob, error: &str) -> Result<(), WorkflowError> {
        self.transition(job, JobStatus::Failed).await?;
        warn!(job_id = %job.id, error, "Job transitioned to Failed");
        Ok(())
    }

    /// Reset a finished job to [`JobStatus::Pending`] for another run.
    pub async fn rearm_job(&self, job: &mut AnalysisJob) -> Result<(), WorkflowError> {
        self.transition(job, JobStatus::Pending).await?;
        self.job_store.set_file_hash(job.id, None).await?;
        info!(job_id = %job.id, "Job re-armed to Pending");
        Ok(())
    }

    // ── Field updates ────────────────────────────────────────────────

    pub async fn record_file_hash(
        &self,
        job: &mut AnalysisJob,
        file_hash: String,
    ) -> Result<(), WorkflowError> {
        self.job_store.set_file_hash(job.id, Some(&file_hash)).await?;
        job.file_hash = Some(file_hash);
        Ok(())
    }

    pub async fn record_execution_info(
        &self,
        job: &mut AnalysisJob,
        execution_info: serde_json::Value,
    ) -> Result<(), WorkflowError> {
        self.job_store
            .set_execution_info(job.id, Some(&execution_info))
            .await?;
        job.execution_info = Some(execution_info);
        Ok(())
    }

    /// Retrieve a job by ID (delegates to store).
    pub async fn get_job(&self, job_id: Uuid) -> Result<Option<AnalysisJob>, JobStoreError> {
        self.job_store.get(job_id).await
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Validate on a copy, persist, then commit to the caller's job.
    async fn transition(&self, job: &mut AnalysisJob, to: JobStatus) -> Result<(), WorkflowError> {
        let mut next = job.clone();
        next.transition(to)?;

        self.job_store
            .update_status(next.id, next.status, next.completion_time)
            .await?;

        *job = next;
        Ok(())
    }
}
