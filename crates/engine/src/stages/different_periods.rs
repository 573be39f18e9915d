//! Batch-wise labs whose batches meet independently.
//!
//! Each lab expands into `(batch, session)` units. Every draw picks a fresh
//! empty two-period slot and either one pending unit or a cluster of 2 to
//! `max_cluster_size` pending units from distinct batches, then places as
//! many of them there as can be staffed and roomed. Units that do not fit are
//! simply left for a later draw. The stage succeeds once nothing is pending
//! and fails after `batch_draw_ceiling` draws.

use super::{pair, Ctx, Journal};
use crate::error::PlacementError;
use crate::grid::SectionGrid;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::trace;
use types::{batch_label, DayOfWeek, Lab, SessionDescriptor, SessionKind, SlotContent, TeacherId};

/// Teacher teams pinned per `labName#batch` for labs with `keep_same_teachers`.
/// Owned by one section's run and handed in explicitly.
#[derive(Clone, Debug, Default)]
pub struct TeamPins(HashMap<String, Vec<TeacherId>>);

impl TeamPins {
    fn key(lab: &Lab, batch: u32) -> String {
        format!("{}#{}", lab.name, batch)
    }

    pub fn get(&self, lab: &Lab, batch: u32) -> Option<&Vec<TeacherId>> {
        self.0.get(&Self::key(lab, batch))
    }

    fn pin(&mut self, lab: &Lab, batch: u32, team: Vec<TeacherId>) {
        self.0.entry(Self::key(lab, batch)).or_insert(team);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Unit {
    lab: usize,
    batch: u32,
}

pub fn place_batch_rotations<R: Rng>(
    ctx: &mut Ctx<'_, R>,
    labs: &[&Lab],
    grid: &mut SectionGrid,
    pins: &mut TeamPins,
) -> Result<(), PlacementError> {
    let mut pending: Vec<Unit> = labs
        .iter()
        .enumerate()
        .flat_map(|(i, lab)| {
            (1..=lab.number_of_batches)
                .flat_map(move |batch| (0..lab.frequency).map(move |_| Unit { lab: i, batch }))
        })
        .collect();
    let mut booked_days: HashSet<(usize, u32, DayOfWeek)> = HashSet::new();

    let mut draws = 0u32;
    while !pending.is_empty() {
        if draws >= ctx.limits.batch_draw_ceiling {
            return Err(PlacementError::BatchDrawsExhausted {
                section: grid.name().to_string(),
                remaining: pending.len(),
                draws,
            });
        }
        draws += 1;

        let Some(start) = ctx.random_double() else {
            continue;
        };
        let slots = pair(start);
        if !ctx.cal.fits_double(start.day, start.period)
            || !slots.iter().all(|&s| grid.is_free(s))
        {
            continue;
        }

        let cluster = draw_cluster(ctx, &pending);
        let mut journal = Journal::default();
        let mut sessions = Vec::new();
        let mut placed = Vec::new();
        for unit in cluster {
            let lab = labs[unit.lab];
            if booked_days.contains(&(unit.lab, unit.batch, start.day)) {
                continue;
            }
            let team = match pins.get(lab, unit.batch) {
                Some(team) if lab.keep_same_teachers => {
                    if !ctx.registry.teachers_free(team, &slots) {
                        continue;
                    }
                    team.clone()
                }
                _ => match ctx.pick_teachers(
                    &lab.teacher_pool,
                    lab.required_teacher_count as usize,
                    &slots,
                ) {
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

            let label = batch_label(unit.batch);
            let message = format!("{}: {} ({label})", grid.name(), lab.name);
            ctx.book_teachers(&mut journal, &team, &slots, &message);
            if let Some(r) = &room {
                ctx.book_room(&mut journal, r, &slots, &message);
            }
            if lab.keep_same_teachers {
                pins.pin(lab, unit.batch, team.clone());
            }
            booked_days.insert((unit.lab, unit.batch, start.day));
            sessions.push(SessionDescriptor {
                name: lab.name.clone(),
                kind: SessionKind::Lab,
                teacher_ids: team,
                room_id: room,
                batch: Some(label),
            });
            placed.push(unit);
        }

        if sessions.is_empty() {
            continue;
        }
        for slot in slots {
            journal.write(grid, slot, SlotContent::Batches(sessions.clone()));
        }
        for unit in placed {
            if let Some(i) = pending.iter().position(|u| *u == unit) {
                pending.swap_remove(i);
            }
        }
    }
    trace!(section = grid.name(), draws, "batch rotations placed");
    Ok(())
}

/// One pending unit, or a random-sized group of pending units that all
/// belong to different batches.
fn draw_cluster<R: Rng>(ctx: &mut Ctx<'_, R>, pending: &[Unit]) -> Vec<Unit> {
    let max = (ctx.limits.max_cluster_size as usize).min(pending.len());
    let size = if max < 2 || ctx.rng.gen_bool(0.5) {
        1
    } else {
        ctx.rng.gen_range(2..=max)
    };
    let mut order: Vec<Unit> = pending.to_vec();
    order.shuffle(&mut *ctx.rng);
    let mut cluster: Vec<Unit> = Vec::with_capacity(size);
    for unit in order {
        if cluster.len() == size {
            break;
        }
        if cluster.iter().all(|u| u.batch != unit.batch) {
            cluster.push(unit);
        }
    }
    cluster
}
