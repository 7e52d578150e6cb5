use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AnalysisJob, JobStatus};

/// Job persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),
    #[error("Job already exists: {0}")]
    AlreadyExists(Uuid),
    #[error("Database operation failed: {0}")]
    Database(String),
    #[error("Corrupt job record: {0}")]
    Corrupt(String),
}

/// Job storage interface.
///
/// Single source of truth for job status. Updates are field-level so that
/// concurrent writers touching different fields never clobber each other.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &AnalysisJob) -> Result<(), JobStoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<AnalysisJob>, JobStoreError>;
    /// All jobs, most recent upload first
    async fn list(&self) -> Result<Vec<AnalysisJob>, JobStoreError>;
    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<AnalysisJob>, JobStoreError>;
    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        completion_time: Option<DateTime<Utc>>,
    ) -> Result<(), JobStoreError>;
    async fn set_file_hash(&self, id: Uuid, file_hash: Option<&str>) -> Result<(), JobStoreError>;
    async fn set_execution_info(
        &self,
        id: Uuid,
        execution_info: Option<&serde_json::Value>,
    ) -> Result<(), JobStoreError>;
}
