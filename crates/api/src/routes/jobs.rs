use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use jobs::JobStatus;
use types::GenerateResult;
use utoipa::ToSchema;

fn lookup(state: &AppState, id: &str) -> Result<JobStatus, ApiError> {
    state
        .jobs
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("job {id} not found")))
}

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Job status", body = jobs::JobStatus),
            (status = 404, description = "Unknown job")
        )
    )]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    lookup(&state, &id).map(Json)
}

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}/result",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Generation result, successful or exhausted", body = GenerateResult),
            (status = 404, description = "Unknown job"),
            (status = 409, description = "Job still running, cancelled or failed")
        )
    )]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GenerateResult>, ApiError> {
    match lookup(&state, &id)? {
        JobStatus::Succeeded { result } | JobStatus::Exhausted { result } => Ok(Json(result)),
        JobStatus::Queued | JobStatus::Running => {
            Err(ApiError::Conflict(format!("job {id} is not finished")))
        }
        JobStatus::Cancelled => Err(ApiError::Conflict(format!("job {id} was cancelled"))),
        JobStatus::Failed { message } => Err(ApiError::Conflict(message)),
    }
}

#[derive(serde::Serialize, ToSchema)]
pub struct CancelOut {
    pub cancelled: bool,
}

#[utoipa::path(
        post,
        path = "/v1/jobs/{id}/cancel",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Whether the job was still cancellable", body = CancelOut),
            (status = 404, description = "Unknown job")
        )
    )]
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelOut>, ApiError> {
    lookup(&state, &id)?;
    Ok(Json(CancelOut {
        cancelled: state.jobs.cancel(&id),
    }))
}
