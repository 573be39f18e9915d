//! Full-class labs: two consecutive periods, one teacher team, the whole
//! section.
//!
//! Each lab gets `lab_outer_attempts` tries at placing all of its sessions.
//! A session that cannot be placed within `lab_inner_attempts` draws rolls
//! back every session of the lab placed in the current outer attempt.

use super::{lab_block_fits, pair, Ctx, Journal};
use crate::error::PlacementError;
use crate::grid::SectionGrid;
use rand::Rng;
use tracing::trace;
use types::{Lab, SessionDescriptor, SessionKind, SlotContent, TeacherId};

pub fn place_full_class_labs<R: Rng>(
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
        let mut pinned: Option<Vec<TeacherId>> = None;
        let complete = (0..lab.frequency)
            .all(|_| place_session(ctx, lab, grid, &mut journal, &mut pinned));
        if complete {
            trace!(section = grid.name(), lab = %lab.name, outer, "full-class lab placed");
            return Ok(());
        }
        ctx.rollback(journal, grid);
    }
    Err(PlacementError::LabExhausted {
        stage: "full-class",
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
    pinned: &mut Option<Vec<TeacherId>>,
) -> bool {
    let required = lab.required_teacher_count as usize;
    for _ in 0..ctx.limits.lab_inner_attempts {
        let Some(start) = ctx.random_double() else {
            continue;
        };
        if !lab_block_fits(ctx.cal, grid, &lab.name, start) {
            continue;
        }
        let slots = pair(start);

        let team = match pinned.as_ref() {
            Some(team) if lab.keep_same_teachers => {
                if !ctx.registry.teachers_free(team, &slots) {
                    continue;
                }
                team.clone()
            }
            _ => match ctx.pick_teachers(&lab.teacher_pool, required, &slots) {
                Some(team) => team,
                None => continue,
            },
        };
        let room = if lab.room_pool.is_empty() {
            None
        } else {
            match ctx.pick_rooms(&lab.room_pool, &slots, 1).pop() {
                Some(r) => Some(r),
                None => continue,
            }
        };

        let message = format!("{}: {}", grid.name(), lab.name);
        ctx.book_teachers(journal, &team, &slots, &message);
        if let Some(r) = &room {
            ctx.book_room(journal, r, &slots, &message);
        }
        let block = SlotContent::Single(SessionDescriptor {
            name: lab.name.clone(),
            kind: SessionKind::Lab,
            teacher_ids: team.clone(),
            room_id: room,
            batch: None,
        });
        for slot in slots {
            journal.write(grid, slot, block.clone());
        }
        if lab.keep_same_teachers && pinned.is_none() {
            *pinned = Some(team);
        }
        return true;
    }
    false
}
