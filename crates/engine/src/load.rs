use std::collections::{BTreeMap, HashMap};
use types::{DayOfWeek, Faculty, LoadEntry, TeacherId};

/// Periods assigned per teacher, overall and per day.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadTracker {
    entries: HashMap<TeacherId, LoadEntry>,
}

impl LoadTracker {
    pub fn add(&mut self, id: &TeacherId, day: DayOfWeek, periods: u32) {
        let e = self.entries.entry(id.clone()).or_default();
        e.total_assigned_periods += periods;
        e.per_day_assigned[day.index()] += periods;
    }

    pub fn remove(&mut self, id: &TeacherId, day: DayOfWeek, periods: u32) {
        if let Some(e) = self.entries.get_mut(id) {
            e.total_assigned_periods = e.total_assigned_periods.saturating_sub(periods);
            let d = &mut e.per_day_assigned[day.index()];
            *d = d.saturating_sub(periods);
        }
    }

    pub fn total(&self, id: &TeacherId) -> u32 {
        self.entries.get(id).map_or(0, |e| e.total_assigned_periods)
    }

    pub fn on_day(&self, id: &TeacherId, day: DayOfWeek) -> u32 {
        self.entries
            .get(id)
            .map_or(0, |e| e.per_day_assigned[day.index()])
    }

    /// Least-loaded first, `day` load as tie-break; equal teachers keep pool order.
    /// An id listed twice in the pool is ranked once.
    pub fn rank<'p>(&self, pool: &'p [TeacherId], day: DayOfWeek) -> Vec<&'p TeacherId> {
        let mut ranked: Vec<&TeacherId> = Vec::with_capacity(pool.len());
        for t in pool {
            if !ranked.contains(&t) {
                ranked.push(t);
            }
        }
        ranked.sort_by_key(|t| (self.total(t), self.on_day(t, day)));
        ranked
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Every faculty member (zeroed when idle) plus anyone else who taught.
    pub fn allocations(&self, faculty: &[Faculty]) -> BTreeMap<TeacherId, LoadEntry> {
        let mut out: BTreeMap<TeacherId, LoadEntry> = faculty
            .iter()
            .map(|f| (f.teacher_id.clone(), LoadEntry::default()))
            .collect();
        for (id, e) in &self.entries {
            out.insert(id.clone(), e.clone());
        }
        out
    }
}
