//! Elective blocks.
//!
//! An elective occurrence reserves every teacher across all of its options at
//! one shared slot and is written into every section's grid: the whole cohort
//! splits into the options at the same time. Draws are bounded; below
//! `elective_day_cap_relax_after` draws an elective may appear at most once
//! per day, from then on the day cap is dropped.

use super::{single_fits, Ctx, Journal};
use crate::error::PlacementError;
use crate::grid::SectionGrid;
use rand::Rng;
use tracing::trace;
use types::{SessionDescriptor, SessionKind, Slot, SlotContent, Subject, TeacherId};

/// Places every elective. Never fails the attempt itself; electives that
/// ran out of draws come back as shortfalls.
pub fn place_electives<R: Rng>(
    ctx: &mut Ctx<'_, R>,
    electives: &[&Subject],
    grids: &mut [SectionGrid],
) -> Vec<PlacementError> {
    let mut shortfalls = Vec::new();
    for elective in electives {
        let placed = place_one(ctx, elective, grids);
        trace!(elective = %elective.name, placed, required = elective.frequency, "elective placed");
        if placed < elective.frequency {
            shortfalls.push(PlacementError::ElectiveShortfall {
                name: elective.name.clone(),
                placed,
                required: elective.frequency,
            });
        }
    }
    shortfalls
}

fn place_one<R: Rng>(ctx: &mut Ctx<'_, R>, elective: &Subject, grids: &mut [SectionGrid]) -> u32 {
    let teachers = elective.all_option_teachers();
    let mut placed = 0u32;
    let mut draws = 0u32;
    while placed < elective.frequency && draws < ctx.limits.elective_draws {
        let capped = draws < ctx.limits.elective_day_cap_relax_after;
        draws += 1;
        let Some(slot) = ctx.random_single() else {
            continue;
        };
        if !accepts(ctx, elective, &teachers, grids, slot, capped) {
            continue;
        }

        // No rollback ever happens at this stage.
        let mut journal = Journal::default();
        ctx.book_teachers(&mut journal, &teachers, &[slot], &elective.name);
        let block = SlotContent::Single(SessionDescriptor {
            name: elective.name.clone(),
            kind: SessionKind::Elective,
            teacher_ids: teachers.clone(),
            room_id: None,
            batch: None,
        });
        for g in grids.iter_mut() {
            g.put(slot, block.clone());
        }
        placed += 1;
    }
    placed
}

fn accepts<R: Rng>(
    ctx: &Ctx<'_, R>,
    elective: &Subject,
    teachers: &[TeacherId],
    grids: &[SectionGrid],
    slot: Slot,
    capped: bool,
) -> bool {
    if !ctx.cal.contains(slot) {
        return false;
    }
    if !grids.iter().all(|g| single_fits(g, &elective.name, slot)) {
        return false;
    }
    if capped
        && grids
            .iter()
            .any(|g| g.count_on_day(slot.day, &elective.name) >= 1)
    {
        return false;
    }
    ctx.registry.teachers_free(teachers, &[slot])
}
