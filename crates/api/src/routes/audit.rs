use axum::Json;
use serde::{Deserialize, Serialize};
use types::{GenerateResult, TimetableConfig, Violation};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AuditIn {
    pub config: TimetableConfig,
    pub result: GenerateResult,
}

#[derive(Serialize, ToSchema)]
pub struct AuditOut {
    pub ok: bool,
    pub violations: Vec<Violation>,
}

#[utoipa::path(
    post,
    path = "/v1/audit",
    request_body = AuditIn,
    responses(
    (status = 200, description = "Hard-constraint violations found in the timetable", body = AuditOut)
    )
)]
pub async fn audit(Json(input): Json<AuditIn>) -> Json<AuditOut> {
    let violations = sched_core::audit::audit(&input.config, &input.result);
    Json(AuditOut {
        ok: violations.is_empty(),
        violations,
    })
}
