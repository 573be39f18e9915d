//! Placement stages and the bookkeeping they share.
//!
//! Every stage mutates the attempt's registry, load tracker and grids only
//! through [`Ctx`]. Anything a stage may have to undo is recorded in a
//! [`Journal`] so rollback releases exactly what was reserved.

pub mod different_periods;
pub mod elective;
pub mod full_class;
pub mod regular;
pub mod same_period;

use crate::availability::{AvailabilityRegistry, Reservation};
use crate::grid::SectionGrid;
use crate::load::LoadTracker;
use rand::seq::SliceRandom;
use rand::Rng;
use sched_core::Calendar;
use types::{DayOfWeek, EngineLimits, RoomId, Slot, TeacherId};

pub struct Ctx<'a, R: Rng> {
    pub cal: &'a Calendar,
    pub limits: &'a EngineLimits,
    pub registry: &'a mut AvailabilityRegistry,
    pub loads: &'a mut LoadTracker,
    pub rng: &'a mut R,
}

/// Reservations, load increments and grid writes of a placement in progress.
#[derive(Debug, Default)]
pub struct Journal {
    reservations: Vec<Reservation>,
    loads: Vec<(TeacherId, DayOfWeek, u32)>,
    cells: Vec<Slot>,
}

impl Journal {
    pub fn write(&mut self, grid: &mut SectionGrid, slot: Slot, content: types::SlotContent) {
        grid.put(slot, content);
        self.cells.push(slot);
    }
}

impl<'a, R: Rng> Ctx<'a, R> {
    /// Reserves every teacher in every slot and charges one period per slot.
    pub fn book_teachers(
        &mut self,
        journal: &mut Journal,
        teachers: &[TeacherId],
        slots: &[Slot],
        message: &str,
    ) {
        for t in teachers {
            for &slot in slots {
                journal
                    .reservations
                    .push(self.registry.reserve_teacher(t, slot, message));
                self.loads.add(t, slot.day, 1);
                journal.loads.push((t.clone(), slot.day, 1));
            }
        }
    }

    pub fn book_room(&mut self, journal: &mut Journal, room: &RoomId, slots: &[Slot], message: &str) {
        for &slot in slots {
            journal
                .reservations
                .push(self.registry.reserve_room(room, slot, message));
        }
    }

    /// Undoes a journal in reverse order.
    pub fn rollback(&mut self, journal: Journal, grid: &mut SectionGrid) {
        for slot in journal.cells.into_iter().rev() {
            grid.clear(slot);
        }
        for (t, day, n) in journal.loads.into_iter().rev() {
            self.loads.remove(&t, day, n);
        }
        for r in journal.reservations.into_iter().rev() {
            self.registry.release(r);
        }
    }

    /// First `count` teachers of `pool`, least loaded first, free in every slot.
    pub fn pick_teachers(
        &self,
        pool: &[TeacherId],
        count: usize,
        slots: &[Slot],
    ) -> Option<Vec<TeacherId>> {
        if count == 0 {
            return Some(Vec::new());
        }
        let day = slots.first()?.day;
        let team: Vec<TeacherId> = self
            .loads
            .rank(pool, day)
            .into_iter()
            .filter(|t| slots.iter().all(|&s| self.registry.is_teacher_free(t, s)))
            .take(count)
            .cloned()
            .collect();
        (team.len() == count).then_some(team)
    }

    /// Up to `max` distinct rooms of `pool`, in pool order, free in every slot.
    pub fn pick_rooms(&self, pool: &[RoomId], slots: &[Slot], max: usize) -> Vec<RoomId> {
        let mut picked: Vec<RoomId> = Vec::with_capacity(max.min(pool.len()));
        for r in pool {
            if picked.len() == max {
                break;
            }
            if !picked.contains(r) && slots.iter().all(|&s| self.registry.is_room_free(r, s)) {
                picked.push(r.clone());
            }
        }
        picked
    }

    pub fn random_day(&mut self) -> Option<DayOfWeek> {
        self.cal.days().choose(&mut *self.rng).copied()
    }

    /// A single period drawn from a random half of a random day.
    pub fn random_single(&mut self) -> Option<Slot> {
        let day = self.random_day()?;
        let n = self.cal.periods_for(day);
        if n == 0 {
            return None;
        }
        let half = n / 2;
        let (lo, hi) = if half > 0 && self.rng.gen_bool(0.5) {
            (0, half)
        } else {
            (half, n)
        };
        Some(Slot::new(day, self.rng.gen_range(lo..hi)))
    }

    /// Start of a two-period block; `period + 1` always exists on the day.
    pub fn random_double(&mut self) -> Option<Slot> {
        let day = self.random_day()?;
        let n = self.cal.periods_for(day);
        if n < 2 {
            return None;
        }
        Some(Slot::new(day, self.rng.gen_range(0..n - 1)))
    }
}

pub fn pair(start: Slot) -> [Slot; 2] {
    [start, Slot::new(start.day, start.period + 1)]
}

/// Slot rules every two-period lab block obeys in a section grid: both periods
/// exist without a break between them, both are empty, the lab is not yet on
/// that day, and the neighbouring days do not hold it in the matching periods.
pub fn lab_block_fits(cal: &Calendar, grid: &SectionGrid, lab: &str, start: Slot) -> bool {
    let [a, b] = pair(start);
    if !cal.fits_double(a.day, a.period) || !grid.is_free(a) || !grid.is_free(b) {
        return false;
    }
    if grid.count_on_day(a.day, lab) > 0 {
        return false;
    }
    [cal.previous_day(a.day), cal.next_day(a.day)]
        .into_iter()
        .flatten()
        .all(|d| {
            !grid.holds(Slot::new(d, a.period), lab) && !grid.holds(Slot::new(d, b.period), lab)
        })
}

/// Slot rules shared by single-period placements: the period is empty and
/// the neighbouring periods on that day do not hold the same item.
pub fn single_fits(grid: &SectionGrid, name: &str, slot: Slot) -> bool {
    if !grid.is_free(slot) {
        return false;
    }
    let before = slot
        .period
        .checked_sub(1)
        .is_some_and(|p| grid.holds(Slot::new(slot.day, p), name));
    let after = grid.holds(Slot::new(slot.day, slot.period + 1), name);
    !before && !after
}
