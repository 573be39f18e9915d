mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod audit;
    pub mod generate;
    pub mod health;
    pub mod jobs;
    pub mod validate;
}

use axum::{
    routing::{get, post},
    Router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::generate::generate,
            routes::jobs::status,
            routes::jobs::result,
            routes::jobs::cancel,
            routes::validate::validate_handler,
            routes::audit::audit,
        ),
        components(schemas(
            types::GenerateRequest, types::GenerateParams, types::EngineLimits,
            types::TimetableConfig, types::Subject, types::SubjectKind, types::ElectiveOption,
            types::Lab, types::LabSessionType, types::BatchScheduleType,
            types::Faculty, types::LabRoom, types::Branch, types::AvailabilityRecord,
            types::GenerateResult, types::LoadEntry, types::SessionDescriptor,
            types::SessionKind, types::SlotContent, types::Violation,
            types::DayOfWeek, types::Slot, types::TeacherId, types::RoomId,
            jobs::JobId, jobs::JobStatus,
            routes::validate::ValidationReport,
            routes::generate::JobCreated,
            routes::jobs::CancelOut,
            routes::audit::AuditIn,
            routes::audit::AuditOut
        )),
        tags(
            (name = "timetable", description = "Class timetable generation API")
        )
    )]
struct ApiDoc;

fn app(app_state: state::AppState) -> Router {
    Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/generate", post(routes::generate::generate))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/audit", post(routes::audit::audit))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .route("/v1/jobs/:id/cancel", post(routes::jobs::cancel))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let app = app(state::AppState::new_default());

    let port = std::env::var("TIMETABLE__SERVER__PORT").unwrap_or_else(|_| "8080".into());
    let addr: std::net::SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
