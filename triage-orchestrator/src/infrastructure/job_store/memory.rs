use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{JobStore, JobStoreError};
use crate::domain::{AnalysisJob, JobStatus};

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, (u64, AnalysisJob)>,
    next_seq: u64,
}

/// Process-local job store for tests and `storage.backend = "memory"`.
#[derive(Default)]
pub struct InMemoryJobStore {
    inner: RwLock<Inner>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<(), JobStoreError>
    where
        F: FnOnce(&mut AnalysisJob) + Send,
    {
        let mut inner = self.inner.write().await;
        let (_, job) = inner.jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        apply(job);
        Ok(())
    }

    fn sorted(mut entries: Vec<(u64, AnalysisJob)>) -> Vec<AnalysisJob> {
        entries.sort_by(|(seq_a, a), (seq_b, b)| {
            b.upload_time
                .cmp(&a.upload_time)
                .then_with(|| seq_b.cmp(seq_a))
        });
        entries.into_iter().map(|(_, job)| job).collect()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &AnalysisJob) -> Result<(), JobStoreError> {
        let mut inner = self.inner.write().await;
        if inner.jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(job.id, (seq, job.clone()));
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisJob>, JobStoreError> {
        Ok(self
            .inner
            .read()
            .await
            .jobs
            .get(&id)
            .map(|(_, job)| job.clone()))
    }

    async fn list(&self) -> Result<Vec<AnalysisJob>, JobStoreError> {
        let entries = self.inner.read().await.jobs.values().cloned().collect();
        Ok(Self::sorted(entries))
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<AnalysisJob>, JobStoreError> {
        let entries = self
            .inner
            .read()
            .await
            .jobs
            .values()
            .filter(|(_, job)| job.status == status)
            .cloned()
            .collect();
        Ok(Self::sorted(entries))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        completion_time: Option<DateTime<Utc>>,
    ) -> Result<(), JobStoreError> {
        self.update(id, |job| {
            job.status = status;
            job.completion_time = completion_time;
        })
        .await
    }

    async fn set_file_hash(&self, id: Uuid, file_hash: Option<&str>) -> Result<(), JobStoreError> {
        let file_hash = file_hash.map(str::to_string);
        self.update(id, |job| job.file_hash = file_hash).await
    }

    async fn set_execution_info(
        &self,
        id: Uuid,
        execution_info: Option<&serde_json::Value>,
    ) -> Result<(), JobStoreError> {
        let execution_info = execution_info.cloned();
        self.update(id, |job| job.execution_info = execution_info)
            .await
    }
}
