use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, Json};
use sched_core::validate;
use types::GenerateRequest;
use utoipa::ToSchema;

#[derive(serde::Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

/// Validates up front so configuration errors come back synchronously;
/// placement itself runs as a job.
#[utoipa::path(
        post,
        path = "/v1/generate",
        request_body = GenerateRequest,
        responses(
            (status = 200, description = "Job enqueued", body = JobCreated),
            (status = 400, description = "Invalid configuration")
        )
    )]
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<JobCreated>, ApiError> {
    validate(&req)?;
    let id = state.jobs.enqueue(req);
    tracing::info!(job = %id.0, "generation enqueued");
    Ok(Json(JobCreated {
        job_id: id.0,
        status: "queued",
    }))
}
