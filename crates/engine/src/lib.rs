//! Randomised, bounded-retry timetable construction.
//!
//! [`TimetableEngine`] validates a request, builds the calendar and hands the
//! run to the [`retry::RetryController`]. The random source is injectable so
//! tests can pin a seed; the [`Generator`] impl seeds from
//! `params.seed` or from entropy.

pub mod availability;
pub mod error;
pub mod grid;
pub mod load;
pub mod retry;
pub mod stages;

use async_trait::async_trait;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sched_core::{validate, CancelFlag, Calendar, ConfigError, Generator};
use tracing::info;
use types::{GenerateRequest, GenerateResult};

pub use error::PlacementError;
pub use retry::{AttemptState, RetryController};

#[derive(Clone, Debug, Default)]
pub struct TimetableEngine;

impl TimetableEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_with_rng<R: Rng>(
        &self,
        req: &GenerateRequest,
        rng: &mut R,
        cancel: &CancelFlag,
    ) -> Result<GenerateResult, ConfigError> {
        validate(req)?;
        let cal = Calendar::from_config(&req.config)?;
        info!(
            sections = req.branch.sections,
            subjects = req.config.subjects.len(),
            labs = req.config.labs.len(),
            max_attempts = req.params.limits.max_attempts,
            "generating timetable"
        );
        Ok(RetryController::new(req, cal).run(rng, cancel))
    }

    /// Runs with a ChaCha8 stream seeded from `params.seed`, or from entropy
    /// when no seed is given.
    pub fn generate_blocking(
        &self,
        req: &GenerateRequest,
        cancel: &CancelFlag,
    ) -> Result<GenerateResult, ConfigError> {
        let mut rng = match req.params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.generate_with_rng(req, &mut rng, cancel)
    }
}

#[async_trait]
impl Generator for TimetableEngine {
    async fn generate(
        &self,
        req: GenerateRequest,
        cancel: CancelFlag,
    ) -> anyhow::Result<GenerateResult> {
        Ok(self.generate_blocking(&req, &cancel)?)
    }
}
