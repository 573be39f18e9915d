//! Regular (single-teacher) subjects. Opt-in via
//! `EngineLimits::place_regular_subjects`; follows the elective slot rules
//! but stays within one section and picks one teacher per period.

use super::{single_fits, Ctx, Journal};
use crate::error::PlacementError;
use crate::grid::SectionGrid;
use rand::Rng;
use tracing::trace;
use types::{SessionDescriptor, SessionKind, SlotContent, Subject};

pub fn place_regular_subjects<R: Rng>(
    ctx: &mut Ctx<'_, R>,
    subjects: &[&Subject],
    grid: &mut SectionGrid,
) -> Vec<PlacementError> {
    let mut shortfalls = Vec::new();
    for subject in subjects {
        let placed = place_one(ctx, subject, grid);
        trace!(section = grid.name(), subject = %subject.name, placed, "regular subject placed");
        if placed < subject.frequency {
            shortfalls.push(PlacementError::SubjectShortfall {
                name: subject.name.clone(),
                section: grid.name().to_string(),
                placed,
                required: subject.frequency,
            });
        }
    }
    shortfalls
}

fn place_one<R: Rng>(ctx: &mut Ctx<'_, R>, subject: &Subject, grid: &mut SectionGrid) -> u32 {
    let message = format!("{}: {}", grid.name(), subject.name);
    let mut placed = 0u32;
    let mut draws = 0u32;
    while placed < subject.frequency && draws < ctx.limits.elective_draws {
        let capped = draws < ctx.limits.elective_day_cap_relax_after;
        draws += 1;
        let Some(slot) = ctx.random_single() else {
            continue;
        };
        if !single_fits(grid, &subject.name, slot)
            || (capped && grid.count_on_day(slot.day, &subject.name) >= 1)
        {
            continue;
        }
        let teacher = if subject.teacher_pool.is_empty() {
            Vec::new()
        } else {
            match ctx.pick_teachers(&subject.teacher_pool, 1, &[slot]) {
                Some(t) => t,
                None => continue,
            }
        };

        let mut journal = Journal::default();
        ctx.book_teachers(&mut journal, &teacher, &[slot], &message);
        journal.write(
            grid,
            slot,
            SlotContent::Single(SessionDescriptor {
                name: subject.name.clone(),
                kind: SessionKind::Regular,
                teacher_ids: teacher,
                room_id: None,
                batch: None,
            }),
        );
        placed += 1;
    }
    placed
}
