//! Handlers for the `/campaigns` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use vizgen_core::post::Post;
use vizgen_engine::SubmitBatch;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /campaigns/{campaign_id}/visuals`.
#[derive(Debug, Deserialize)]
pub struct SubmitVisualsRequest {
    pub posts: Vec<Post>,
    #[serde(default)]
    pub business_context: serde_json::Value,
    #[serde(default)]
    pub objective: String,
}

/// POST /api/v1/campaigns/{campaign_id}/visuals
///
/// Queue generation jobs for every post that needs visuals. Returns 202
/// with the created jobs (possibly none) without waiting for generation.
/// Undecodable bodies are reported in the `{error, code}` envelope.
pub async fn submit_visuals(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    body: Result<Json<SubmitVisualsRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    let jobs = state
        .engine
        .submit(SubmitBatch {
            campaign_id,
            posts: input.posts,
            business_context: input.business_context,
            objective: input.objective,
        })
        .await?;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: jobs })))
}

/// GET /api/v1/campaigns/{campaign_id}/status
///
/// Aggregate status of every job in the campaign. Unknown campaigns
/// report zero jobs.
pub async fn get_campaign_status(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let status = state.engine.campaign_status(&campaign_id).await;
    Ok(Json(DataResponse { data: status }))
}
