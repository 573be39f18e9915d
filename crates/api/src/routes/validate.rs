use axum::{http::StatusCode, Json};
use sched_core::{validate, ConfigError};
use serde::Serialize;
use types::GenerateRequest;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = GenerateRequest,
    responses(
    (status = 200, description = "Validation result", body = ValidationReport)
    )
)]
pub async fn validate_handler(
    Json(req): Json<GenerateRequest>,
) -> (StatusCode, Json<ValidationReport>) {
    let errors = match validate(&req) {
        Ok(()) => vec![],
        Err(ConfigError::Msg(msg)) => msg
            .split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(other) => vec![other.to_string()],
    };
    (
        StatusCode::OK,
        Json(ValidationReport {
            ok: errors.is_empty(),
            errors,
        }),
    )
}
