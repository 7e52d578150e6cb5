//! Orchestrator infrastructure: persistence, on-disk layout and the worker pool

pub mod job_queue;
pub mod job_store;
pub mod storage;

pub use job_queue::{
    JobQueueError, JobQueueHandle, JobQueueReceiver, JobWorkerContext, QueuedAnalysisJob,
    job_queue, spawn_job_worker_pool,
};
pub use job_store::{InMemoryJobStore, JobStore, JobStoreError, SqliteJobStore};
pub use storage::Storage;
