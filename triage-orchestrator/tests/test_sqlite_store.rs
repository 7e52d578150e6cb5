//! SQLite job store contract and a full pipeline run on top of it

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{HarnessOptions, TestHarness};
use triage_orchestrator::domain::{AnalysisJob, AnalysisKind, JobStatus};
use triage_orchestrator::infrastructure::{JobStore, JobStoreError, SqliteJobStore};
use uuid::Uuid;

async fn open_store(dir: &tempfile::TempDir) -> SqliteJobStore {
    SqliteJobStore::connect(dir.path().join("db").join("analyzer.db"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_get_and_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let job = AnalysisJob::new("evil.bin");
    store.create(&job).await.unwrap();

    let loaded = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, job.id);
    assert_eq!(loaded.filename, "evil.bin");
    assert_eq!(loaded.status, JobStatus::Pending);
    assert_eq!(loaded.analysis_kind, AnalysisKind::File);
    assert!(loaded.completion_time.is_none());
    assert!(loaded.file_hash.is_none());
    assert!(loaded.execution_info.is_none());
    assert_eq!(
        loaded.upload_time.timestamp_micros(),
        job.upload_time.timestamp_micros()
    );

    assert!(matches!(
        store.create(&job).await,
        Err(JobStoreError::AlreadyExists(id)) if id == job.id
    ));
    assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_field_updates_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let job = AnalysisJob::interactive();
    store.create(&job).await.unwrap();

    let finished_at = Utc::now();
    store
        .update_status(job.id, JobStatus::Completed, Some(finished_at))
        .await
        .unwrap();
    store.set_file_hash(job.id, Some("abc123")).await.unwrap();
    let info = serde_json::json!({"message": "placeholder", "tools": ["file", "strings"]});
    store.set_execution_info(job.id, Some(&info)).await.unwrap();

    let loaded = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Completed);
    assert_eq!(loaded.analysis_kind, AnalysisKind::Interactive);
    assert_eq!(
        loaded.completion_time.map(|t| t.timestamp_micros()),
        Some(finished_at.timestamp_micros())
    );
    assert_eq!(loaded.file_hash.as_deref(), Some("abc123"));
    assert_eq!(loaded.execution_info, Some(info));

    store.update_status(job.id, JobStatus::Pending, None).await.unwrap();
    store.set_file_hash(job.id, None).await.unwrap();
    let loaded = store.get(job.id).await.unwrap().unwrap();
    assert!(loaded.completion_time.is_none());
    assert!(loaded.file_hash.is_none());
}

#[tokio::test]
async fn test_updates_on_missing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let id = Uuid::new_v4();

    assert!(matches!(
        store.update_status(id, JobStatus::Running, None).await,
        Err(JobStoreError::NotFound(_))
    ));
    assert!(matches!(
        store.set_file_hash(id, Some("x")).await,
        Err(JobStoreError::NotFound(_))
    ));
    assert!(matches!(
        store.set_execution_info(id, None).await,
        Err(JobStoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_order_and_status_filter() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let mut oldest = AnalysisJob::new("old.bin");
    oldest.upload_time = Utc::now() - Duration::hours(2);
    let mut middle = AnalysisJob::new("mid.bin");
    middle.upload_time = Utc::now() - Duration::hours(1);
    let newest = AnalysisJob::new("new.bin");

    // Insertion order differs from upload order
    store.create(&middle).await.unwrap();
    store.create(&newest).await.unwrap();
    store.create(&oldest).await.unwrap();

    let ids: Vec<Uuid> = store.list().await.unwrap().iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);

    store
        .update_status(middle.id, JobStatus::Running, None)
        .await
        .unwrap();
    let running = store.list_by_status(JobStatus::Running).await.unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, middle.id);
    assert_eq!(store.list_by_status(JobStatus::Pending).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_records_survive_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let job = AnalysisJob::new("durable.bin");
    {
        let store = open_store(&dir).await;
        store.create(&job).await.unwrap();
        store
            .update_status(job.id, JobStatus::Running, None)
            .await
            .unwrap();
    }

    let reopened = open_store(&dir).await;
    let loaded = reopened.get(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Running);
}

#[tokio::test]
async fn test_pipeline_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn JobStore> = Arc::new(open_store(&dir).await);
    let harness = TestHarness::with_options(HarnessOptions {
        store: Some(store),
        ..HarnessOptions::default()
    })
    .await;

    let job = harness.orchestrator.submit("a.bin", b"abc").await.unwrap();
    let finished = harness.wait_for_terminal(job.id).await;
    assert_eq!(finished.status, JobStatus::Completed);
    assert!(finished.file_hash.is_some());
    assert!(finished.completion_time.is_some());
    assert!(finished.execution_info.is_some());
}
