use axum::{
    extract::{Multipart, Path, State},
    response::Json,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::{ResultsLookup, SessionInfo};
use crate::domain::AnalysisJob;
use crate::presentation::controllers::{ApiError, OrchestratorState, parse_job_id};
use crate::presentation::models::{
    AnalysisResultsResponse, CompletedResultsResponse, ErrorResponse, ResultsStatusResponse,
    UploadForm,
};

const UPLOAD_FIELD: &str = "file";
const NOT_READY_MESSAGE: &str = "Analysis is not finished yet";
const NO_RESULTS_MESSAGE: &str = "Interactive sessions do not produce analysis results";

/// POST /upload - Submit a file for analysis
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Analysis registered and scheduled", body = AnalysisJob),
        (status = 400, description = "Missing file or invalid filename", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 503, description = "Analysis queue is full", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn upload_file(
    State(state): State<OrchestratorState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisJob>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Ignoring unexpected multipart field");
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        info!(filename = %filename, size = bytes.len(), "Received upload");

        let job = state.orchestrator.submit(&filename, &bytes).await?;
        return Ok(Json(job));
    }

    Err(ApiError::bad_request(
        "MISSING_FILE",
        "Multipart field 'file' is required",
    ))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::new(err.status(), "INVALID_UPLOAD", err.body_text())
}

/// GET /files - List all analyses, most recent first
#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "All analyses", body = [AnalysisJob]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn list_files(
    State(state): State<OrchestratorState>,
) -> Result<Json<Vec<AnalysisJob>>, ApiError> {
    Ok(Json(state.orchestrator.list().await?))
}

/// GET /files/{id} - Retrieve one analysis
#[utoipa::path(
    get,
    path = "/files/{id}",
    params(
        ("id" = Uuid, Path, description = "Analysis ID")
    ),
    responses(
        (status = 200, description = "Analysis found", body = AnalysisJob),
        (status = 404, description = "Analysis not found", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn get_file(
    State(state): State<OrchestratorState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisJob>, ApiError> {
    let id = parse_job_id(&id)?;
    Ok(Json(state.orchestrator.get(id).await?))
}

/// GET /files/{id}/results - Result bundle of a completed analysis
///
/// Unfinished analyses and completed ones whose bundle is missing are not
/// errors: both answer 200 with a `status` describing the situation.
#[utoipa::path(
    get,
    path = "/files/{id}/results",
    params(
        ("id" = Uuid, Path, description = "Analysis ID")
    ),
    responses(
        (status = 200, description = "Results, or the reason they are unavailable", body = AnalysisResultsResponse),
        (status = 404, description = "Analysis not found", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn get_results(
    State(state): State<OrchestratorState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResultsResponse>, ApiError> {
    let id = parse_job_id(&id)?;

    let response = match state.resolver.resolve(id).await? {
        ResultsLookup::Ready(bundle) => AnalysisResultsResponse::Completed(CompletedResultsResponse {
            analysis_id: id,
            status: "completed".to_string(),
            metadata: bundle.metadata,
            tools_results: bundle.tools,
        }),
        ResultsLookup::NotReady { status } => {
            AnalysisResultsResponse::Status(ResultsStatusResponse {
                analysis_id: id,
                status: status.to_string(),
                message: NOT_READY_MESSAGE.to_string(),
            })
        }
        ResultsLookup::NoResults { kind } => {
            debug!(job_id = %id, %kind, "Results requested for a job without results");
            AnalysisResultsResponse::Status(ResultsStatusResponse {
                analysis_id: id,
                status: "no_results".to_string(),
                message: NO_RESULTS_MESSAGE.to_string(),
            })
        }
        ResultsLookup::Integrity { message } => {
            AnalysisResultsResponse::Status(ResultsStatusResponse {
                analysis_id: id,
                status: "error".to_string(),
                message,
            })
        }
    };

    Ok(Json(response))
}

/// POST /files/{id}/restart - Run a finished analysis again
#[utoipa::path(
    post,
    path = "/files/{id}/restart",
    params(
        ("id" = Uuid, Path, description = "Analysis ID")
    ),
    responses(
        (status = 200, description = "Analysis re-armed and scheduled", body = AnalysisJob),
        (status = 404, description = "Analysis not found", body = ErrorResponse),
        (status = 409, description = "Analysis is still pending or running", body = ErrorResponse),
        (status = 410, description = "Original file is no longer available", body = ErrorResponse),
        (status = 503, description = "Analysis queue is full", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn restart_analysis(
    State(state): State<OrchestratorState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisJob>, ApiError> {
    let id = parse_job_id(&id)?;
    Ok(Json(state.orchestrator.restart(id).await?))
}

/// POST /interactive - Create a placeholder interactive session
#[utoipa::path(
    post,
    path = "/interactive",
    responses(
        (status = 200, description = "Placeholder session created", body = AnalysisJob),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "interactive"
)]
pub async fn start_interactive_session(
    State(state): State<OrchestratorState>,
) -> Result<Json<AnalysisJob>, ApiError> {
    Ok(Json(state.orchestrator.start_interactive_session().await?))
}

/// GET /files/{id}/session - Session details of an interactive job
#[utoipa::path(
    get,
    path = "/files/{id}/session",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session details", body = SessionInfo),
        (status = 400, description = "Not an interactive session, or no details recorded", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "interactive"
)]
pub async fn get_session_info(
    State(state): State<OrchestratorState>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>, ApiError> {
    let id = parse_job_id(&id)?;
    Ok(Json(state.orchestrator.session_info(id).await?))
}
