use std::time::Duration;
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::trace::HttpMakeClassifier;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

/// Timetable requests carry whole curricula and availability maps.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

type Layers = Stack<
    TimeoutLayer,
    Stack<RequestBodyLimitLayer, Stack<CorsLayer, Stack<TraceLayer<HttpMakeClassifier>, Identity>>>,
>;

/// Handlers only enqueue or inspect; generation itself runs as a job, so a
/// short request timeout is enough.
pub fn stack() -> ServiceBuilder<Layers> {
    let trace = TraceLayer::new_for_http();
    let cors = CorsLayer::permissive();
    let limit = RequestBodyLimitLayer::new(MAX_BODY_BYTES);
    let timeout = TimeoutLayer::new(Duration::from_secs(30));

    ServiceBuilder::new()
        .layer(trace)
        .layer(cors)
        .layer(limit)
        .layer(timeout)
}
