//! Result Resolver - locate and load the bundle of a completed job

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use triage_core::domain::ResultBundle;
use triage_core::infrastructure::{BundleStoreError, load_bundle, read_completion_marker};

use crate::domain::{AnalysisKind, JobStatus};
use crate::infrastructure::job_store::{JobStore, JobStoreError};
use crate::infrastructure::storage::Storage;

/// Outcome of a results lookup for a known job.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsLookup {
    /// The job has not completed; nothing to load yet
    NotReady { status: JobStatus },
    Ready(ResultBundle),
    /// Interactive placeholder sessions never produce a bundle
    NoResults { kind: AnalysisKind },
    /// The job is `completed` but its on-disk results are missing or unreadable
    Integrity { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Analysis not found: {0}")]
    NotFound(Uuid),

    #[error("Persistence error: {0}")]
    Store(#[from] JobStoreError),
}

pub struct ResultResolver {
    job_store: Arc<dyn JobStore>,
    storage: Arc<Storage>,
}

impl ResultResolver {
    pub fn new(job_store: Arc<dyn JobStore>, storage: Arc<Storage>) -> Self {
        Self { job_store, storage }
    }

    /// Read-only: never regenerates a bundle.
    pub async fn resolve(&self, id: Uuid) -> Result<ResultsLookup, ResolveError> {
        let job = self
            .job_store
            .get(id)
            .await?
            .ok_or(ResolveError::NotFound(id))?;

        if job.analysis_kind == AnalysisKind::Interactive {
            return Ok(ResultsLookup::NoResults {
                kind: job.analysis_kind,
            });
        }

        if job.status != JobStatus::Completed {
            return Ok(ResultsLookup::NotReady { status: job.status });
        }

        let results_dir = self.storage.results_dir_for(id);
        if !tokio::fs::try_exists(&results_dir).await.unwrap_or(false) {
            return Ok(integrity(id, "Results directory not found".to_string()));
        }

        let bundle_name = match read_completion_marker(&results_dir).await {
            Ok(Some(name)) => name,
            Ok(None) => return Ok(integrity(id, "Completion marker not found".to_string())),
            Err(e) => return Ok(integrity(id, format!("Unreadable completion marker: {}", e))),
        };

        match load_bundle(&results_dir, &bundle_name).await {
            Ok(bundle) => Ok(ResultsLookup::Ready(bundle)),
            Err(e) if e.is_not_found() => Ok(integrity(
                id,
                format!("Result bundle {} not found", bundle_name),
            )),
            Err(BundleStoreError::Serialization(e)) => Ok(integrity(
                id,
                format!("Result bundle {} is not valid: {}", bundle_name, e),
            )),
            Err(e) => Ok(integrity(id, format!("Unreadable result bundle: {}", e))),
        }
    }
}

fn integrity(id: Uuid, message: String) -> ResultsLookup {
    warn!(job_id = %id, %message, "Completed job has no usable results");
    ResultsLookup::Integrity { message }
}
