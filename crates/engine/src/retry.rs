//! Retry controller.
//!
//! A run is a sequence of independent attempts. Each attempt restores the
//! availability registry from the baseline built once from the request,
//! clears the load tracker, places electives for the whole cohort and then,
//! section by section, the different-periods, same-period and full-class
//! labs (and regular subjects when enabled). Any failure abandons the whole
//! attempt. The first attempt that completes wins; after `max_attempts`
//! failures the run is exhausted and nothing partial is returned.

use crate::availability::AvailabilityRegistry;
use crate::error::PlacementError;
use crate::grid::SectionGrid;
use crate::load::LoadTracker;
use crate::stages::different_periods::{place_batch_rotations, TeamPins};
use crate::stages::elective::place_electives;
use crate::stages::full_class::place_full_class_labs;
use crate::stages::regular::place_regular_subjects;
use crate::stages::same_period::place_same_period_labs;
use crate::stages::Ctx;
use rand::Rng;
use sched_core::{CancelFlag, Calendar};
use tracing::{debug, info, warn};
use types::{GenerateRequest, GenerateResult, Lab, LabPlacement, Subject};

/// The curriculum split by owning stage.
#[derive(Debug, Default)]
pub struct Plan<'a> {
    pub electives: Vec<&'a Subject>,
    pub regular: Vec<&'a Subject>,
    pub full_class: Vec<&'a Lab>,
    pub same_period: Vec<&'a Lab>,
    pub different_periods: Vec<&'a Lab>,
}

impl<'a> Plan<'a> {
    pub fn from_request(req: &'a GenerateRequest) -> Self {
        let mut plan = Plan::default();
        for s in &req.config.subjects {
            if s.is_elective() {
                plan.electives.push(s);
            } else {
                plan.regular.push(s);
            }
        }
        for lab in &req.config.labs {
            match lab.placement() {
                LabPlacement::FullClass => plan.full_class.push(lab),
                LabPlacement::SamePeriod => plan.same_period.push(lab),
                LabPlacement::DifferentPeriods => plan.different_periods.push(lab),
            }
        }
        plan
    }
}

/// Mutable state reused across attempts: the working registry is reset to
/// the baseline in place instead of being rebuilt from the request.
struct Arena {
    baseline: AvailabilityRegistry,
    registry: AvailabilityRegistry,
    loads: LoadTracker,
}

impl Arena {
    fn new(baseline: AvailabilityRegistry) -> Self {
        Self {
            registry: baseline.clone(),
            baseline,
            loads: LoadTracker::default(),
        }
    }

    fn reset(&mut self) {
        self.registry.clone_from(&self.baseline);
        self.loads.reset();
    }
}

#[derive(Debug)]
pub enum AttemptState {
    Attempting {
        attempt: u32,
        last_error: Option<PlacementError>,
    },
    Succeeded {
        attempts: u32,
        grids: Vec<SectionGrid>,
    },
    Exhausted {
        attempts: u32,
        last_error: Option<PlacementError>,
    },
    Cancelled {
        attempts: u32,
    },
}

pub struct RetryController<'a> {
    req: &'a GenerateRequest,
    cal: Calendar,
    plan: Plan<'a>,
    sections: Vec<String>,
}

impl<'a> RetryController<'a> {
    pub fn new(req: &'a GenerateRequest, cal: Calendar) -> Self {
        Self {
            req,
            cal,
            plan: Plan::from_request(req),
            sections: req.branch.resolved_section_names(),
        }
    }

    pub fn run<R: Rng>(&self, rng: &mut R, cancel: &CancelFlag) -> GenerateResult {
        let limits = &self.req.params.limits;
        let mut arena = Arena::new(self.baseline());
        let mut state = AttemptState::Attempting {
            attempt: 1,
            last_error: None,
        };
        loop {
            state = match state {
                AttemptState::Attempting {
                    attempt,
                    last_error,
                } => {
                    if attempt > limits.max_attempts {
                        AttemptState::Exhausted {
                            attempts: attempt - 1,
                            last_error,
                        }
                    } else if cancel.is_cancelled() {
                        AttemptState::Cancelled {
                            attempts: attempt - 1,
                        }
                    } else {
                        match self.attempt(&mut arena, rng) {
                            Ok(grids) => AttemptState::Succeeded {
                                attempts: attempt,
                                grids,
                            },
                            Err(e) => {
                                debug!(attempt, error = %e, "attempt abandoned");
                                AttemptState::Attempting {
                                    attempt: attempt + 1,
                                    last_error: Some(e),
                                }
                            }
                        }
                    }
                }
                terminal => return self.finish(terminal, arena),
            };
        }
    }

    fn baseline(&self) -> AvailabilityRegistry {
        let mut reg = AvailabilityRegistry::from_inputs(&self.req.faculty, &self.req.rooms);
        let cfg = &self.req.config;
        let teachers = cfg
            .subjects
            .iter()
            .flat_map(|s| s.teacher_pool.iter().chain(s.options.iter().flat_map(|o| &o.teacher_pool)))
            .chain(cfg.labs.iter().flat_map(|l| &l.teacher_pool));
        let rooms = cfg.labs.iter().flat_map(|l| &l.room_pool);
        reg.register(teachers, rooms);
        reg
    }

    fn attempt<R: Rng>(
        &self,
        arena: &mut Arena,
        rng: &mut R,
    ) -> Result<Vec<SectionGrid>, PlacementError> {
        arena.reset();
        let limits = &self.req.params.limits;
        let mut ctx = Ctx {
            cal: &self.cal,
            limits,
            registry: &mut arena.registry,
            loads: &mut arena.loads,
            rng,
        };
        let mut grids: Vec<SectionGrid> = self
            .sections
            .iter()
            .map(|name| SectionGrid::new(name.clone(), &self.cal))
            .collect();

        if let Some(short) = place_electives(&mut ctx, &self.plan.electives, &mut grids)
            .into_iter()
            .next()
        {
            return Err(short);
        }

        for grid in grids.iter_mut() {
            let mut pins = TeamPins::default();
            place_batch_rotations(&mut ctx, &self.plan.different_periods, grid, &mut pins)?;
            place_same_period_labs(&mut ctx, &self.plan.same_period, grid)?;
            place_full_class_labs(&mut ctx, &self.plan.full_class, grid)?;
            if limits.place_regular_subjects {
                if let Some(short) = place_regular_subjects(&mut ctx, &self.plan.regular, grid)
                    .into_iter()
                    .next()
                {
                    return Err(short);
                }
            }
        }
        Ok(grids)
    }

    fn finish(&self, state: AttemptState, arena: Arena) -> GenerateResult {
        match state {
            AttemptState::Succeeded { attempts, grids } => {
                info!(attempts, sections = grids.len(), "timetable generated");
                GenerateResult::succeeded(
                    grids.into_iter().map(SectionGrid::into_timetable).collect(),
                    arena.loads.allocations(&self.req.faculty),
                    arena.registry.teacher_map(),
                    arena.registry.room_map(),
                    attempts,
                )
            }
            AttemptState::Exhausted {
                attempts,
                last_error,
            } => {
                let reason = last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no attempts were allowed".into());
                warn!(attempts, %reason, "timetable generation exhausted");
                GenerateResult::failed(
                    format!("placement exhausted after {attempts} attempts: {reason}"),
                    attempts,
                )
            }
            AttemptState::Cancelled { attempts } => {
                info!(attempts, "timetable generation cancelled");
                GenerateResult::failed("generation cancelled", attempts)
            }
            AttemptState::Attempting { attempt, .. } => {
                GenerateResult::failed("generation stopped mid-run", attempt.saturating_sub(1))
            }
        }
    }
}
