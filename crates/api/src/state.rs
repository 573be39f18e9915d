use jobs::InMemJobs;
use std::sync::Arc;
use timetable_engine::TimetableEngine;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<TimetableEngine>>,
}

impl AppState {
    pub fn new_default() -> Self {
        let jobs = InMemJobs::new(TimetableEngine::new());
        Self {
            jobs: Arc::new(jobs),
        }
    }
}
