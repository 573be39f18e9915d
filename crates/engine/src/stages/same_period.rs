//! Batch-wise labs whose batches all meet in the same two-period slot.
//!
//! Every batch gets its own team of `required_teacher_count` teachers drawn
//! without repeats from the lab's pool, and its own room while rooms last;
//! batches beyond the free room count go without one. Outer/inner attempt
//! budgets and rollback match the full-class stage.

use super::{lab_block_fits, pair, Ctx, Journal};
use crate::error::PlacementError;
use crate::grid::SectionGrid;
use rand::Rng;
use tracing::trace;
use types::{batch_label, Lab, SessionDescriptor, SessionKind, SlotContent, TeacherId};

pub fn place_same_period_labs<R: Rng>(
    ctx: &mut Ctx<'_, R>,
    labs: &[&Lab],
    grid: &mut SectionGrid,
) -> Result<(), PlacementError> {
    for lab in labs {
        place_lab(ctx, lab, grid)?;
    }
    Ok(())
}

fn place_lab<R: Rng>(
    ctx: &mut Ctx<'_, R>,
    lab: &Lab,
    grid: &mut SectionGrid,
) -> Result<(), PlacementError> {
    for outer in 0..ctx.limits.lab_outer_attempts {
        let mut journal = Journal::default();
        let mut pinned: Option<Vec<Vec<TeacherId>>> = None;
        let complete = (0..lab.frequency)
            .all(|_| place_session(ctx, lab, grid, &mut journal, &mut pinned));
        if complete {
            trace!(section = grid.name(), lab = %lab.name, outer, "same-period lab placed");
            return Ok(());
        }
        ctx.rollback(journal, grid);
    }
    Err(PlacementError::LabExhausted {
        stage: "same-period",
        lab: lab.name.clone(),
        section: grid.name().to_string(),
        attempts: ctx.limits.lab_outer_attempts,
    })
}

fn place_session<R: Rng>(
    ctx: &mut Ctx<'_, R>,
    lab: &Lab,
    grid: &mut SectionGrid,
    journal: &mut Journal,
    pinned: &mut Option<Vec<Vec<TeacherId>>>,
) -> bool {
    let batches = lab.number_of_batches as usize;
    let required = lab.required_teacher_count as usize;
    for _ in 0..ctx.limits.lab_inner_attempts {
        let Some(start) = ctx.random_double() else {
            continue;
        };
        if !lab_block_fits(ctx.cal, grid, &lab.name, start) {
            continue;
        }
        let slots = pair(start);

        let teams: Vec<Vec<TeacherId>> = match pinned.as_ref() {
            Some(teams) if lab.keep_same_teachers => {
                if !teams.iter().all(|t| ctx.registry.teachers_free(t, &slots)) {
                    continue;
                }
                teams.clone()
            }
            _ => match ctx.pick_teachers(&lab.teacher_pool, required * batches, &slots) {
                Some(all) => split_teams(all, required, batches),
                None => continue,
            },
        };
        let mut rooms = ctx
            .pick_rooms(&lab.room_pool, &slots, lab.room_pool.len().min(batches))
            .into_iter();

        let mut sessions = Vec::with_capacity(batches);
        for (i, team) in teams.iter().enumerate() {
            let label = batch_label(i as u32 + 1);
            let message = format!("{}: {} ({label})", grid.name(), lab.name);
            let room = rooms.next();
            ctx.book_teachers(journal, team, &slots, &message);
            if let Some(r) = &room {
                ctx.book_room(journal, r, &slots, &message);
            }
            sessions.push(SessionDescriptor {
                name: lab.name.clone(),
                kind: SessionKind::Lab,
                teacher_ids: team.clone(),
                room_id: room,
                batch: Some(label),
            });
        }
        for slot in slots {
            journal.write(grid, slot, SlotContent::Batches(sessions.clone()));
        }
        if lab.keep_same_teachers && pinned.is_none() {
            *pinned = Some(teams);
        }
        return true;
    }
    false
}

fn split_teams(all: Vec<TeacherId>, required: usize, batches: usize) -> Vec<Vec<TeacherId>> {
    if required == 0 {
        return vec![Vec::new(); batches];
    }
    all.chunks(required).map(<[TeacherId]>::to_vec).collect()
}
