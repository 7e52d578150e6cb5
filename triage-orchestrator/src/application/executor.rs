//! Analysis Executor - one full run of the tool sequence for one job
//!
//! ```text
//! pending ─► running ─► materialize ─► execution_info ─► fingerprint ─►
//!            tools ─► <sha256>.json ─► completed marker ─► completed
//! ```
//!
//! Any fault after `running` moves the job to `failed`.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use triage_core::domain::ResultBundle;
use triage_core::infrastructure::{
    BundleStoreError, fingerprint_file, write_bundle, write_completion_marker,
};
use triage_sandbox::ToolSequence;

use crate::application::workflow::{JobWorkflow, WorkflowError};
use crate::domain::AnalysisJob;
use crate::infrastructure::storage::Storage;

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Result bundle error: {0}")]
    Bundle(#[from] BundleStoreError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

pub struct AnalysisExecutor {
    workflow: Arc<JobWorkflow>,
    storage: Arc<Storage>,
    sequence: Arc<ToolSequence>,
}

impl AnalysisExecutor {
    pub fn new(
        workflow: Arc<JobWorkflow>,
        storage: Arc<Storage>,
        sequence: Arc<ToolSequence>,
    ) -> Self {
        Self {
            workflow,
            storage,
            sequence,
        }
    }

    /// Run the analysis of `job_id` against the bytes at `source`.
    ///
    /// Returns an error only when the job could not be started or its final
    /// status could not be persisted; analysis faults end as `failed`.
    pub async fn execute(&self, job_id: Uuid, source: &Path) -> Result<(), ExecutionError> {
        let mut job = self
            .workflow
            .get_job(job_id)
            .await
            .map_err(WorkflowError::from)?
            .ok_or(ExecutionError::JobNotFound(job_id))?;

        self.workflow.start_job(&mut job).await?;

        match self.run(&mut job, source).await {
            Ok(bundle_name) => {
                self.workflow.complete_job(&mut job).await?;
                info!(job_id = %job_id, bundle = %bundle_name, "Analysis completed");
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Analysis failed");
                self.workflow.fail_job(&mut job, &e.to_string()).await?;
            }
        }

        Ok(())
    }

    async fn run(&self, job: &mut AnalysisJob, source: &Path) -> Result<String, ExecutionError> {
        let (work_path, results_dir) = self
            .storage
            .prepare_run(job.id, &job.filename, source)
            .await?;

        let execution_info = json!({
            "runner": self.sequence.runner_name(),
            "tools": self.sequence.tool_names(),
            "working_dir": self.storage.work_dir(job.id).display().to_string(),
            "tool_timeout_seconds": self.sequence.default_timeout().as_secs(),
            "started_at": Utc::now().to_rfc3339(),
        });
        self.workflow
            .record_execution_info(job, execution_info)
            .await?;

        let (hashes, filesize) = fingerprint_file(&work_path).await?;
        self.workflow
            .record_file_hash(job, hashes.sha256.clone())
            .await?;

        let outcomes = self.sequence.run_all(&work_path).await;

        let bundle = ResultBundle::new(job.filename.clone(), filesize, hashes, Utc::now(), outcomes);
        let bundle_name = write_bundle(&results_dir, &bundle).await?;
        write_completion_marker(&results_dir, &bundle_name).await?;

        Ok(bundle_name)
    }
}
