//! Extraction API: submit a run, poll its status, fetch its results.
//!
//! Submission is asynchronous: the handler returns the run id as soon as the
//! run record exists and its supervisor is scheduled. Progress is observed by
//! polling the status and results endpoints.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::kernel::runs::{LookupError, RunResultsView, RunStatusView, SubmitError};
use crate::kernel::ServerDeps;

/// API-facing error with an HTTP mapping. Polling always returns a
/// well-formed body; internal detail stays in the logs.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    ShuttingDown,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            ApiError::ShuttingDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service is shutting down".to_string(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error serving extraction API");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::UnknownDocument(filename) => {
                ApiError::NotFound(format!("unknown document: {}", filename))
            }
            SubmitError::ShuttingDown => ApiError::ShuttingDown,
            SubmitError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(run_id) => {
                ApiError::NotFound(format!("run {} not found", run_id))
            }
            LookupError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtractionRequest {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub run_id: i64,
}

/// POST /api/v1/extract
///
/// Create a run for the document and return its id immediately. Repeated
/// submissions for the same document create distinct runs.
pub async fn submit_extraction(
    Extension(deps): Extension<ServerDeps>,
    Json(request): Json<ExtractionRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let run_id = deps.registry.submit(&request.filename).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { run_id })))
}

/// GET /api/v1/runs/:id/status
pub async fn run_status(
    Extension(deps): Extension<ServerDeps>,
    Path(run_id): Path<i64>,
) -> Result<Json<RunStatusView>, ApiError> {
    let view = deps.status_reader.status(run_id).await?;
    Ok(Json(view))
}

/// GET /api/v1/runs/:id/results
///
/// Always returns the current snapshot: partial results and trace logs while
/// the run is in progress, the full set once it is terminal.
pub async fn run_results(
    Extension(deps): Extension<ServerDeps>,
    Path(run_id): Path<i64>,
) -> Result<Json<RunResultsView>, ApiError> {
    let view = deps.status_reader.results(run_id).await?;
    Ok(Json(view))
}
