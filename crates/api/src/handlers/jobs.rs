//! Handlers for the `/jobs` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use vizgen_core::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn job_not_found(job_id: String) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Job",
        id: job_id,
    })
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .engine
        .job_status(&job_id)
        .await
        .ok_or_else(|| job_not_found(job_id))?;
    Ok(Json(DataResponse { data: job }))
}

/// GET /api/v1/jobs/{id}/progress
///
/// Current step label and progress fraction of one job.
pub async fn get_job_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let progress = state
        .engine
        .job_progress(&job_id)
        .await
        .ok_or_else(|| job_not_found(job_id))?;
    Ok(Json(DataResponse { data: progress }))
}

/// POST /api/v1/jobs/{id}/cancel
///
/// Cancel a job that is still queued. Returns 204 on success and 409 if
/// a worker already picked it up or it has finished.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<StatusCode> {
    state.engine.cancel_job(&job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
