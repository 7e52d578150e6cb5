//! Shared harness: a full pipeline over temporary directories with real
//! POSIX utilities standing in for the inspection tools.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use triage_core::domain::ToolSpec;
use triage_orchestrator::application::{
    AnalysisExecutor, JobOrchestrator, JobWorkflow, ResultResolver,
};
use triage_orchestrator::domain::{AnalysisJob, JobStatus};
use triage_orchestrator::infrastructure::{
    InMemoryJobStore, JobQueueReceiver, JobStore, JobStoreError, JobWorkerContext, Storage,
    job_queue, spawn_job_worker_pool,
};
use triage_orchestrator::presentation::OrchestratorState;
use triage_sandbox::{ProcessToolRunner, SandboxPolicy, ToolSequence};

/// 17 bytes: a fake PE header followed by an ASCII marker
pub const EVIL_BIN: &[u8] = b"MZ\x90\x00evil-payload!";

pub fn posix_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new("size", "wc", &["-c", "{file}"]),
        ToolSpec::new("magic", "head", &["-c", "2", "{file}"]),
        ToolSpec::new("dump", "cat", &[]),
    ]
}

/// Store whose first write of `fail_status` errors, as a locked database would
pub struct FlakyStore {
    inner: InMemoryJobStore,
    fail_status: JobStatus,
    tripped: AtomicBool,
}

impl FlakyStore {
    pub fn failing_once_on(fail_status: JobStatus) -> Self {
        Self {
            inner: InMemoryJobStore::new(),
            fail_status,
            tripped: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl JobStore for FlakyStore {
    async fn create(&self, job: &AnalysisJob) -> Result<(), JobStoreError> {
        self.inner.create(job).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisJob>, JobStoreError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<AnalysisJob>, JobStoreError> {
        self.inner.list().await
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<AnalysisJob>, JobStoreError> {
        self.inner.list_by_status(status).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        completion_time: Option<DateTime<Utc>>,
    ) -> Result<(), JobStoreError> {
        if status == self.fail_status && !self.tripped.swap(true, Ordering::SeqCst) {
            return Err(JobStoreError::Database("database is locked".to_string()));
        }
        self.inner.update_status(id, status, completion_time).await
    }

    async fn set_file_hash(&self, id: Uuid, file_hash: Option<&str>) -> Result<(), JobStoreError> {
        self.inner.set_file_hash(id, file_hash).await
    }

    async fn set_execution_info(
        &self,
        id: Uuid,
        execution_info: Option<&serde_json::Value>,
    ) -> Result<(), JobStoreError> {
        self.inner.set_execution_info(id, execution_info).await
    }
}

pub struct HarnessOptions {
    pub tools: Vec<ToolSpec>,
    pub queue_capacity: usize,
    pub start_workers: bool,
    pub store: Option<Arc<dyn JobStore>>,
    /// Create the results root as a regular file so every run fails
    pub break_results_dir: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            tools: posix_tools(),
            queue_capacity: 16,
            start_workers: true,
            store: None,
            break_results_dir: false,
        }
    }
}

pub struct TestHarness {
    pub root: TempDir,
    pub store: Arc<dyn JobStore>,
    pub storage: Arc<Storage>,
    pub workflow: Arc<JobWorkflow>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub resolver: Arc<ResultResolver>,
    pub shutdown: CancellationToken,
    pub worker_pool: Option<JoinHandle<()>>,
    _parked_receiver: Option<JobQueueReceiver>,
}

impl TestHarness {
    pub async fn start() -> Self {
        Self::with_options(HarnessOptions::default()).await
    }

    pub async fn with_options(options: HarnessOptions) -> Self {
        let root = tempfile::tempdir().unwrap();
        let upload_dir = root.path().join("uploads");
        let results_dir = root.path().join("results");

        std::fs::create_dir_all(&upload_dir).unwrap();
        if options.break_results_dir {
            std::fs::write(&results_dir, b"not a directory").unwrap();
        } else {
            std::fs::create_dir_all(&results_dir).unwrap();
        }

        let store = options
            .store
            .unwrap_or_else(|| Arc::new(InMemoryJobStore::new()) as Arc<dyn JobStore>);
        let storage = Arc::new(Storage::new(upload_dir, results_dir));
        let workflow = Arc::new(JobWorkflow::new(store.clone()));

        let sequence = Arc::new(ToolSequence::new(
            options.tools,
            Arc::new(ProcessToolRunner::new()),
            SandboxPolicy::unrestricted(Duration::from_secs(10)),
        ));
        let executor = Arc::new(AnalysisExecutor::new(
            workflow.clone(),
            storage.clone(),
            sequence,
        ));

        let (queue, receiver) = job_queue(options.queue_capacity);
        let shutdown = CancellationToken::new();

        let mut parked_receiver = None;
        let mut worker_pool = None;
        if options.start_workers {
            worker_pool = Some(spawn_job_worker_pool(
                JobWorkerContext {
                    executor,
                    workflow: workflow.clone(),
                },
                receiver,
                2,
                shutdown.clone(),
            ));
        } else {
            // Queue stays open but never drains
            parked_receiver = Some(receiver);
        }

        let orchestrator = Arc::new(JobOrchestrator::new(
            workflow.clone(),
            storage.clone(),
            queue,
        ));
        let resolver = Arc::new(ResultResolver::new(store.clone(), storage.clone()));

        Self {
            root,
            store,
            storage,
            workflow,
            orchestrator,
            resolver,
            shutdown,
            worker_pool,
            _parked_receiver: parked_receiver,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        OrchestratorState {
            orchestrator: self.orchestrator.clone(),
            resolver: self.resolver.clone(),
        }
    }

    pub fn results_root(&self) -> PathBuf {
        self.root.path().join("results")
    }

    pub async fn job(&self, id: Uuid) -> AnalysisJob {
        self.store.get(id).await.unwrap().expect("job exists")
    }

    /// Poll the store until the job reaches `completed` or `failed`.
    pub async fn wait_for_terminal(&self, id: Uuid) -> AnalysisJob {
        let deadline = Instant::now() + Duration::from_secs(30);
        loop {
            let job = self.job(id).await;
            if job.status.is_terminal() {
                return job;
            }
            assert!(Instant::now() < deadline, "job {} stuck in {}", id, job.status);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
