use parking_lot::RwLock;
use sched_core::{CancelFlag, Generator};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use types::{GenerateRequest, GenerateResult};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded { result: GenerateResult },
    Exhausted { result: GenerateResult },
    Cancelled,
    Failed { message: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    pub fn result(&self) -> Option<&GenerateResult> {
        match self {
            JobStatus::Succeeded { result } | JobStatus::Exhausted { result } => Some(result),
            _ => None,
        }
    }
}

struct Entry {
    status: JobStatus,
    cancel: CancelFlag,
}

/// Generation runs keyed by job id, each on its own task.
#[derive(Clone)]
pub struct InMemJobs<G: Generator> {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    generator: Arc<G>,
}

impl<G: Generator> InMemJobs<G> {
    pub fn new(generator: G) -> Self {
        Self {
            inner: Default::default(),
            generator: Arc::new(generator),
        }
    }

    pub fn enqueue(&self, req: GenerateRequest) -> JobId {
        let id = Uuid::new_v4().to_string();
        let cancel = CancelFlag::new();
        self.inner.write().insert(
            id.clone(),
            Entry {
                status: JobStatus::Queued,
                cancel: cancel.clone(),
            },
        );

        let map = self.inner.clone();
        let generator = self.generator.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            if !set_status(&map, &id_for_task, JobStatus::Running) {
                return;
            }
            let status = match generator.generate(req, cancel.clone()).await {
                Ok(_) if cancel.is_cancelled() => JobStatus::Cancelled,
                Ok(result) if result.success => JobStatus::Succeeded { result },
                Ok(result) => JobStatus::Exhausted { result },
                Err(e) => {
                    error!(?e, "job failed");
                    JobStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            info!(job = %id_for_task, "job finished");
            set_status(&map, &id_for_task, status);
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).map(|e| e.status.clone())
    }

    /// Flags a queued or running job. The run stops before its next attempt.
    /// Returns false for unknown or already finished jobs.
    pub fn cancel(&self, id: &str) -> bool {
        let mut w = self.inner.write();
        let Some(entry) = w.get_mut(id) else {
            return false;
        };
        match entry.status {
            JobStatus::Queued => {
                entry.cancel.cancel();
                entry.status = JobStatus::Cancelled;
                true
            }
            JobStatus::Running => {
                entry.cancel.cancel();
                true
            }
            _ => false,
        }
    }
}

/// Updates a job unless it was already cancelled; returns whether it did.
fn set_status(map: &RwLock<HashMap<String, Entry>>, id: &str, status: JobStatus) -> bool {
    let mut w = map.write();
    match w.get_mut(id) {
        Some(entry) if !matches!(entry.status, JobStatus::Cancelled) => {
            entry.status = status;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Succeeds on odd section counts, exhausts on even ones, errors on zero.
    /// With `spin` set it loops until cancelled.
    struct Fake {
        spin: bool,
    }

    #[async_trait]
    impl Generator for Fake {
        async fn generate(
            &self,
            req: GenerateRequest,
            cancel: CancelFlag,
        ) -> anyhow::Result<GenerateResult> {
            let mut attempts = 0;
            while self.spin && !cancel.is_cancelled() {
                attempts += 1;
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            if cancel.is_cancelled() {
                return Ok(GenerateResult::failed("generation cancelled", attempts));
            }
            match req.branch.sections {
                0 => anyhow::bail!("branch has no sections"),
                n if n % 2 == 1 => Ok(GenerateResult {
                    success: true,
                    attempts: 1,
                    ..Default::default()
                }),
                _ => Ok(GenerateResult::failed("placement exhausted", 3)),
            }
        }
    }

    fn request(sections: u32) -> GenerateRequest {
        serde_json::from_value(serde_json::json!({
            "config": { "weekdayPeriods": 6 },
            "branch": { "sections": sections }
        }))
        .unwrap()
    }

    async fn settle<G: Generator>(jobs: &InMemJobs<G>, id: &JobId) -> JobStatus {
        for _ in 0..500 {
            if let Some(s) = jobs.get(&id.0).filter(JobStatus::is_terminal) {
                return s;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("job {} never finished", id.0);
    }

    #[tokio::test]
    async fn terminal_states_follow_the_result() {
        let jobs = InMemJobs::new(Fake { spin: false });
        let ok = jobs.enqueue(request(1));
        let exhausted = jobs.enqueue(request(2));
        let failed = jobs.enqueue(request(0));

        assert!(matches!(settle(&jobs, &ok).await, JobStatus::Succeeded { .. }));
        let JobStatus::Exhausted { result } = settle(&jobs, &exhausted).await else {
            panic!("expected exhaustion");
        };
        assert_eq!(result.attempts, 3);
        let JobStatus::Failed { message } = settle(&jobs, &failed).await else {
            panic!("expected failure");
        };
        assert!(message.contains("no sections"));
        assert!(jobs.get("missing").is_none());
    }

    #[tokio::test]
    async fn running_job_can_be_cancelled_once() {
        let jobs = InMemJobs::new(Fake { spin: true });
        let id = jobs.enqueue(request(1));
        assert!(jobs.cancel(&id.0));
        assert!(matches!(settle(&jobs, &id).await, JobStatus::Cancelled));
        assert!(!jobs.cancel(&id.0));
        assert!(!jobs.cancel("missing"));
    }

    #[test]
    fn status_serialises_with_tag() {
        let v = serde_json::to_value(JobStatus::Failed {
            message: "boom".into(),
        })
        .unwrap();
        assert_eq!(v["status"], "Failed");
        assert_eq!(v["message"], "boom");
        assert!(JobStatus::Cancelled.result().is_none());
    }
}
