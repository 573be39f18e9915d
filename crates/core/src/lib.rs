pub mod audit;
pub mod calendar;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

pub use calendar::Calendar;
pub use types::{
    Branch, Faculty, GenerateParams, GenerateRequest, GenerateResult, Lab, LabRoom, SectionTimetable,
    Slot, Subject, TimetableConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("weekday period count must be at least 1")]
    NoWeekdayPeriods,
    #[error("branch has no sections")]
    NoSections,
    #[error("invalid configuration: {0}")]
    Msg(String),
}

pub fn validate(req: &GenerateRequest) -> Result<(), ConfigError> {
    let cfg = &req.config;
    let cal = Calendar::from_config(cfg)?;
    if req.branch.sections == 0 {
        return Err(ConfigError::NoSections);
    }

    let mut errors: Vec<String> = Vec::new();

    for (label, b) in [
        ("shortBreakAfter", cfg.short_break_after),
        ("lunchBreakAfter", cfg.lunch_break_after),
    ] {
        if b >= cfg.weekday_periods && b != 0 {
            errors.push(format!(
                "{label}={b} is outside the {} weekday periods",
                cfg.weekday_periods
            ));
        }
    }

    fn chk_unique<I: ToString>(name: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {name} id: {s}"));
            }
        }
    }
    chk_unique("teacher", req.faculty.iter().map(|f| &f.teacher_id.0), &mut errors);
    chk_unique("room", req.rooms.iter().map(|r| &r.lab_id.0), &mut errors);

    for f in &req.faculty {
        for key in f.unavailability.keys() {
            if Slot::parse_key(key).is_none() {
                errors.push(format!("teacher {} has malformed slot key {key}", f.teacher_id));
            }
        }
    }
    for r in &req.rooms {
        for key in r.unavailability.keys() {
            if Slot::parse_key(key).is_none() {
                errors.push(format!("room {} has malformed slot key {key}", r.lab_id));
            }
        }
    }

    // A lab meets at most once a day (per batch) and every session takes two
    // periods of the section's week.
    let days = cal.days().len() as u32;
    let periods = cal.slots().count() as u32;
    for lab in &cfg.labs {
        if lab.session_type == types::LabSessionType::BatchWise && lab.number_of_batches == 0 {
            errors.push(format!("lab {} is batch-wise with 0 batches", lab.name));
        }
        if lab.frequency > days {
            errors.push(format!(
                "lab {} needs {} sessions but the week has {days} days",
                lab.name, lab.frequency
            ));
        } else {
            // same-period batches share their slots
            let blocks = match lab.placement() {
                types::LabPlacement::SamePeriod => lab.frequency,
                _ => lab.expected_sessions(),
            };
            if blocks.saturating_mul(2) > periods {
                errors.push(format!(
                    "lab {} needs {blocks} sessions, more than {periods} periods hold",
                    lab.name
                ));
            }
        }
    }
    for s in &cfg.subjects {
        if s.is_elective() && s.options.is_empty() {
            errors.push(format!("elective {} has no options", s.name));
        }
        if s.frequency > periods {
            errors.push(format!(
                "subject {} needs {} periods but the week has {periods}",
                s.name, s.frequency
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Msg(errors.join("; ")))
    }
}

/// Shared flag a caller flips to abandon a run between attempts.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Anything that turns a request into a weekly timetable. Configuration
/// errors come back as `Err`; exhausted or cancelled runs as an unsuccessful
/// `GenerateResult`.
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    async fn generate(
        &self,
        req: GenerateRequest,
        cancel: CancelFlag,
    ) -> anyhow::Result<GenerateResult>;
}
