//! Integration tests for API endpoints

mod common;

use std::time::{Duration, Instant};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::{EVIL_BIN, HarnessOptions, TestHarness};
use triage_core::config::ServerConfig;
use triage_core::domain::Fingerprints;
use triage_orchestrator::presentation::create_router;

const BOUNDARY: &str = "triage-test-boundary";

fn router(harness: &TestHarness) -> Router {
    create_router(harness.state(), &ServerConfig::default())
}

fn multipart_upload(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn poll_until_finished(router: &Router, id: &str) -> Value {
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        let (status, body) = send(router, get(&format!("/files/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "completed" || body["status"] == "failed" {
            return body;
        }
        assert!(Instant::now() < deadline, "analysis {id} never finished");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let harness = TestHarness::start().await;
    let (status, body) = send(&router(&harness), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let harness = TestHarness::start().await;
    let (status, body) = send(&router(&harness), get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/files/{id}/results"].is_object());
}

#[tokio::test]
async fn test_upload_poll_and_fetch_results() {
    let harness = TestHarness::start().await;
    let router = router(&harness);

    let (status, job) = send(&router, multipart_upload("file", "evil.bin", EVIL_BIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["filename"], "evil.bin");
    assert_eq!(job["analysis_kind"], "file");
    assert!(job["completion_time"].is_null());
    let id = job["id"].as_str().unwrap().to_string();

    let finished = poll_until_finished(&router, &id).await;
    assert_eq!(finished["status"], "completed");
    assert_eq!(
        finished["file_hash"],
        Fingerprints::from_bytes(EVIL_BIN).sha256
    );
    assert!(finished["completion_time"].is_string());

    let (status, results) = send(&router, get(&format!("/files/{id}/results"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["analysis_id"], id.as_str());
    assert_eq!(results["status"], "completed");
    assert_eq!(results["metadata"]["filesize"], 17);
    for tool in ["size", "magic", "dump"] {
        assert!(results["tools_results"][tool].is_object(), "missing {tool}");
    }

    let (status, listed) = send(&router, get("/files")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pending_results_are_not_ready() {
    let harness = TestHarness::with_options(HarnessOptions {
        start_workers: false,
        ..HarnessOptions::default()
    })
    .await;
    let router = router(&harness);

    let (_, job) = send(&router, multipart_upload("file", "a.bin", b"abc")).await;
    let id = job["id"].as_str().unwrap();
    assert_eq!(job["status"], "pending");

    let (status, body) = send(&router, get(&format!("/files/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");

    let (status, body) = send(&router, get(&format!("/files/{id}/results"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert!(body["message"].is_string());
    assert!(body.get("tools_results").is_none());
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let harness = TestHarness::start().await;
    let router = router(&harness);
    let unknown = uuid::Uuid::new_v4();

    for uri in [
        format!("/files/{unknown}"),
        format!("/files/{unknown}/results"),
        "/files/not-a-uuid".to_string(),
        "/files/not-a-uuid/results".to_string(),
    ] {
        let (status, body) = send(&router, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    let (status, _) = send(&router, post(&format!("/files/{unknown}/restart"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_without_file_field_is_rejected() {
    let harness = TestHarness::start().await;
    let (status, body) = send(
        &router(&harness),
        multipart_upload("attachment", "a.bin", b"abc"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FILE");
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let harness = TestHarness::start().await;
    let config = ServerConfig {
        max_upload_bytes: 64,
        ..ServerConfig::default()
    };
    let router = create_router(harness.state(), &config);

    let response = router
        .oneshot(multipart_upload("file", "big.bin", &[0u8; 1024]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(harness.orchestrator.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_restart_busy_job_conflicts() {
    let harness = TestHarness::with_options(HarnessOptions {
        start_workers: false,
        ..HarnessOptions::default()
    })
    .await;
    let router = router(&harness);

    let (_, job) = send(&router, multipart_upload("file", "a.bin", b"abc")).await;
    let id = job["id"].as_str().unwrap();

    let (status, body) = send(&router, post(&format!("/files/{id}/restart"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "JOB_BUSY");
}

#[tokio::test]
async fn test_restart_completed_job() {
    let harness = TestHarness::start().await;
    let router = router(&harness);

    let (_, job) = send(&router, multipart_upload("file", "a.bin", b"abc")).await;
    let id = job["id"].as_str().unwrap().to_string();
    poll_until_finished(&router, &id).await;

    let (status, body) = send(&router, post(&format!("/files/{id}/restart"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["status"], "pending");
    assert!(body["file_hash"].is_null());

    let finished = poll_until_finished(&router, &id).await;
    assert_eq!(finished["status"], "completed");
}

#[tokio::test]
async fn test_restart_without_source_is_gone() {
    let harness = TestHarness::start().await;
    let router = router(&harness);

    let (_, job) = send(&router, multipart_upload("file", "a.bin", b"abc")).await;
    let id = job["id"].as_str().unwrap().to_string();
    poll_until_finished(&router, &id).await;

    let uuid = id.parse().unwrap();
    std::fs::remove_file(harness.storage.source_path(uuid, "a.bin")).unwrap();
    std::fs::remove_file(harness.storage.work_path(uuid, "a.bin")).unwrap();

    let (status, body) = send(&router, post(&format!("/files/{id}/restart"))).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "SOURCE_UNAVAILABLE");
}

#[tokio::test]
async fn test_completed_job_without_marker_reports_error_status() {
    let harness = TestHarness::start().await;
    let router = router(&harness);

    let (_, job) = send(&router, multipart_upload("file", "a.bin", b"abc")).await;
    let id = job["id"].as_str().unwrap().to_string();
    poll_until_finished(&router, &id).await;

    let results_dir = harness.storage.results_dir_for(id.parse().unwrap());
    std::fs::remove_file(results_dir.join("completed")).unwrap();

    let (status, body) = send(&router, get(&format!("/files/{id}/results"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_interactive_session_endpoints() {
    let harness = TestHarness::start().await;
    let router = router(&harness);

    let (status, session) = send(&router, post("/interactive")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["analysis_kind"], "interactive");
    assert_eq!(session["status"], "completed");
    let id = session["id"].as_str().unwrap();

    let (status, info) = send(&router, get(&format!("/files/{id}/session"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["session_id"], id);
    assert!(info["message"].is_string());

    let (status, results) = send(&router, get(&format!("/files/{id}/results"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["analysis_id"], id);
    assert_eq!(results["status"], "no_results");
    assert!(results["message"].as_str().unwrap().contains("Interactive"));

    let (_, job) = send(&router, multipart_upload("file", "a.bin", b"abc")).await;
    let file_id = job["id"].as_str().unwrap();
    let (status, body) = send(&router, get(&format!("/files/{file_id}/session"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOT_INTERACTIVE");
}
