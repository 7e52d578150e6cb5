//! Orchestrator API controllers

pub mod health;
pub mod jobs;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use crate::application::{JobOrchestrator, OrchestratorError, ResolveError, ResultResolver};
use crate::presentation::models::ErrorResponse;

/// Application state for orchestrator
#[derive(Clone)]
pub struct OrchestratorState {
    pub orchestrator: Arc<JobOrchestrator>,
    pub resolver: Arc<ResultResolver>,
}

/// Error rendered as an [`ErrorResponse`]
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    fn internal(err: impl std::fmt::Display) -> Self {
        error!(error = %err, "Request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            code: self.code.to_string(),
            message: self.message,
            timestamp: Utc::now(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        let message = err.to_string();
        match err {
            OrchestratorError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
            OrchestratorError::InvalidFilename(_) => Self::bad_request("INVALID_FILENAME", message),
            OrchestratorError::JobBusy { .. } => Self::new(StatusCode::CONFLICT, "JOB_BUSY", message),
            OrchestratorError::SourceUnavailable(_) => {
                Self::new(StatusCode::GONE, "SOURCE_UNAVAILABLE", message)
            }
            OrchestratorError::QueueFull | OrchestratorError::QueueClosed => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "QUEUE_FULL", message)
            }
            OrchestratorError::NotInteractive(_) => Self::bad_request("NOT_INTERACTIVE", message),
            OrchestratorError::NoSessionInfo(_) => Self::bad_request("NO_SESSION_INFO", message),
            OrchestratorError::Store(_)
            | OrchestratorError::Workflow(_)
            | OrchestratorError::Io(_) => Self::internal(err),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            ResolveError::Store(_) => Self::internal(err),
        }
    }
}

/// Malformed ids name no job, so they are reported like unknown ones.
pub(crate) fn parse_job_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Analysis not found: {}", raw),
        )
    })
}
