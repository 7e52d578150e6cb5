//! Route definitions and server setup

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    response::Json,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use triage_core::config::ServerConfig;

use crate::application::SessionInfo;
use crate::domain::{AnalysisJob, AnalysisKind, JobStatus};
use crate::presentation::{
    controllers::{
        OrchestratorState,
        health::health_check,
        jobs::{
            get_file, get_results, get_session_info, list_files, restart_analysis,
            start_interactive_session, upload_file,
        },
    },
    models::*,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::health::health_check,
        crate::presentation::controllers::jobs::upload_file,
        crate::presentation::controllers::jobs::list_files,
        crate::presentation::controllers::jobs::get_file,
        crate::presentation::controllers::jobs::get_results,
        crate::presentation::controllers::jobs::restart_analysis,
        crate::presentation::controllers::jobs::start_interactive_session,
        crate::presentation::controllers::jobs::get_session_info
    ),
    components(
        schemas(
            AnalysisJob,
            AnalysisKind,
            JobStatus,
            SessionInfo,
            UploadForm,
            CompletedResultsResponse,
            ResultsStatusResponse,
            AnalysisResultsResponse,
            ErrorResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "analysis", description = "File submission, status polling and result retrieval"),
        (name = "interactive", description = "Placeholder interactive sessions"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Triage API",
        version = "0.1.0",
        description = "Upload a binary, run static inspection tools against it in the background and fetch the aggregated result bundle."
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build CORS from configuration.
///
/// `["*"]` allows any origin without credentials; anything else is an
/// explicit allow-list with credentials enabled.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let headers = [header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN];

    if config.allowed_origins.len() == 1 && config.allowed_origins[0] == "*" {
        return CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::any())
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(false)
            .max_age(Duration::from_secs(3600));
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| {
                    tracing::warn!(origin, "Invalid CORS origin in config; skipping");
                })
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Create the application router
pub fn create_router(state: OrchestratorState, config: &ServerConfig) -> Router {
    let analysis_routes = Router::new()
        .route("/upload", post(upload_file))
        .route("/files", get(list_files))
        .route("/files/{id}", get(get_file))
        .route("/files/{id}/results", get(get_results))
        .route("/files/{id}/restart", post(restart_analysis))
        .route("/files/{id}/session", get(get_session_info))
        .route("/interactive", post(start_interactive_session));

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config));

    Router::new()
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(analysis_routes)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(service_builder)
        .with_state(state)
}
