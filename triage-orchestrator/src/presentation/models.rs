//! API request and response models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use triage_core::domain::{BundleMetadata, ToolOutcome};

/// Error response model
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "NOT_FOUND")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "Analysis not found: 6f1c2b0e-59c8-4f3e-9a55-8f0e3c1d2a4b")]
    pub message: String,

    /// Error occurrence timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,

    /// Current service version
    #[schema(example = "0.1.0")]
    pub version: String,

    pub timestamp: DateTime<Utc>,
}

/// Multipart upload body
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Binary to analyze
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Results of a completed analysis
#[derive(Debug, Serialize, ToSchema)]
pub struct CompletedResultsResponse {
    pub analysis_id: Uuid,
    #[schema(example = "completed")]
    pub status: String,
    /// File name, size, hashes and analysis timestamp
    #[schema(value_type = Object)]
    pub metadata: BundleMetadata,
    /// Outcome of every tool, keyed by tool name
    #[schema(value_type = Object)]
    pub tools_results: BTreeMap<String, ToolOutcome>,
}

/// Results are not available: still in progress, or lost
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsStatusResponse {
    pub analysis_id: Uuid,
    /// Current job status, `error` when a completed job has no usable bundle,
    /// or `no_results` for interactive sessions
    #[schema(example = "running")]
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AnalysisResultsResponse {
    Completed(CompletedResultsResponse),
    Status(ResultsStatusResponse),
}
