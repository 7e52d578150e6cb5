//! Application setup and wiring

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use triage_core::Config;
use triage_core::config::StorageBackend;
use triage_orchestrator::application::{
    AnalysisExecutor, JobOrchestrator, JobWorkflow, ResultResolver,
};
use triage_orchestrator::infrastructure::{
    InMemoryJobStore, JobStore, JobWorkerContext, SqliteJobStore, Storage, job_queue,
    spawn_job_worker_pool,
};
use triage_orchestrator::presentation::{OrchestratorState, create_router};
use triage_sandbox::{ProcessToolRunner, SandboxPolicy, ToolSequence};

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
    pub worker_pool: JoinHandle<()>,
}

async fn open_job_store(config: &Config) -> anyhow::Result<Arc<dyn JobStore>> {
    let store: Arc<dyn JobStore> = match config.storage.backend {
        StorageBackend::Sqlite => {
            tracing::info!(database = %config.storage.database_url, "Opening SQLite job store");
            Arc::new(
                SqliteJobStore::connect(&config.storage.database_url)
                    .await
                    .with_context(|| {
                        format!("Failed to open job store {}", config.storage.database_url)
                    })?,
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory job store; job records are lost on restart");
            Arc::new(InMemoryJobStore::new())
        }
    };
    Ok(store)
}

/// Create the application router and return an AppHandle for shutdown coordination
pub async fn create_app(config: Config) -> anyhow::Result<AppHandle> {
    let startup_time = Instant::now();
    let shutdown_token = CancellationToken::new();

    let storage = Arc::new(Storage::from_config(&config.storage));
    storage
        .bootstrap()
        .await
        .context("Failed to create upload and results directories")?;

    let job_store = open_job_store(&config).await?;
    let workflow = Arc::new(JobWorkflow::new(job_store.clone()));

    let policy = SandboxPolicy::from_config(&config.sandbox, config.analysis.tool_timeout());
    let sequence = Arc::new(ToolSequence::new(
        config.analysis.tools.clone(),
        Arc::new(ProcessToolRunner::new()),
        policy,
    ));
    tracing::info!(
        tools = ?sequence.tool_names(),
        runner = sequence.runner_name(),
        timeout_secs = sequence.default_timeout().as_secs(),
        "Tool sequence configured"
    );

    let executor = Arc::new(AnalysisExecutor::new(
        workflow.clone(),
        storage.clone(),
        sequence,
    ));

    let (queue, receiver) = job_queue(config.analysis.queue_capacity);
    let worker_pool = spawn_job_worker_pool(
        JobWorkerContext {
            executor,
            workflow: workflow.clone(),
        },
        receiver,
        config.analysis.max_concurrent_jobs,
        shutdown_token.clone(),
    );

    let orchestrator = Arc::new(JobOrchestrator::new(workflow, storage.clone(), queue));
    let resolver = Arc::new(ResultResolver::new(job_store, storage));

    let recovery = orchestrator
        .recover_interrupted()
        .await
        .context("Failed to recover jobs from a previous run")?;
    if recovery.failed > 0 || recovery.requeued > 0 {
        tracing::warn!(
            failed = recovery.failed,
            requeued = recovery.requeued,
            "Recovered jobs interrupted by the previous shutdown"
        );
    }

    let state = OrchestratorState {
        orchestrator,
        resolver,
    };
    let router = create_router(state, &config.server);

    tracing::info!(
        elapsed_ms = startup_time.elapsed().as_millis() as u64,
        "Application initialized"
    );

    Ok(AppHandle {
        router,
        shutdown_token,
        worker_pool,
    })
}
