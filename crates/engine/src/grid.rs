use sched_core::Calendar;
use std::collections::BTreeMap;
use types::{DayOfWeek, SectionTimetable, Slot, SlotContent};

/// One section's weekly grid under construction.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionGrid {
    name: String,
    cells: BTreeMap<DayOfWeek, Vec<Option<SlotContent>>>,
}

impl SectionGrid {
    pub fn new(name: impl Into<String>, cal: &Calendar) -> Self {
        Self {
            name: name.into(),
            cells: cal
                .days()
                .iter()
                .map(|&d| (d, vec![None; cal.periods_for(d)]))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, slot: Slot) -> Option<&SlotContent> {
        self.cells
            .get(&slot.day)
            .and_then(|v| v.get(slot.period))
            .and_then(Option::as_ref)
    }

    /// In range and empty.
    pub fn is_free(&self, slot: Slot) -> bool {
        matches!(
            self.cells.get(&slot.day).and_then(|v| v.get(slot.period)),
            Some(None)
        )
    }

    pub fn holds(&self, slot: Slot, name: &str) -> bool {
        self.get(slot)
            .is_some_and(|c| c.sessions().iter().any(|s| s.name == name))
    }

    /// Cells on `day` holding a session named `name`.
    pub fn count_on_day(&self, day: DayOfWeek, name: &str) -> usize {
        self.cells.get(&day).map_or(0, |v| {
            v.iter()
                .flatten()
                .filter(|c| c.sessions().iter().any(|s| s.name == name))
                .count()
        })
    }

    pub fn put(&mut self, slot: Slot, content: SlotContent) {
        if let Some(cell) = self
            .cells
            .get_mut(&slot.day)
            .and_then(|v| v.get_mut(slot.period))
        {
            *cell = Some(content);
        }
    }

    pub fn clear(&mut self, slot: Slot) {
        if let Some(cell) = self
            .cells
            .get_mut(&slot.day)
            .and_then(|v| v.get_mut(slot.period))
        {
            *cell = None;
        }
    }

    pub fn into_timetable(self) -> (String, SectionTimetable) {
        (self.name, self.cells)
    }
}
