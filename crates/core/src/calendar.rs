//! Weekly period grid.
//!
//! Mon..Fri always carry `weekday_periods` periods; Sat is part of the week
//! only when `saturday_periods > 0`. Breaks are expressed as "after 1-based
//! period N", so a break after period 2 separates 0-based indices 1 and 2.

use crate::ConfigError;
use types::{DayOfWeek, Slot, TimetableConfig};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Calendar {
    days: Vec<DayOfWeek>,
    weekday_periods: usize,
    saturday_periods: usize,
    breaks_after: Vec<usize>,
}

impl Calendar {
    pub fn new(
        weekday_periods: u32,
        saturday_periods: u32,
        short_break_after: u32,
        lunch_break_after: u32,
    ) -> Result<Self, ConfigError> {
        if weekday_periods == 0 {
            return Err(ConfigError::NoWeekdayPeriods);
        }
        let mut days = DayOfWeek::WEEKDAYS.to_vec();
        if saturday_periods > 0 {
            days.push(DayOfWeek::Sat);
        }
        let breaks_after = [short_break_after, lunch_break_after]
            .into_iter()
            .filter(|&b| b > 0)
            .map(|b| b as usize)
            .collect();
        Ok(Self {
            days,
            weekday_periods: weekday_periods as usize,
            saturday_periods: saturday_periods as usize,
            breaks_after,
        })
    }

    pub fn from_config(cfg: &TimetableConfig) -> Result<Self, ConfigError> {
        Self::new(
            cfg.weekday_periods,
            cfg.saturday_periods,
            cfg.short_break_after,
            cfg.lunch_break_after,
        )
    }

    pub fn days(&self) -> &[DayOfWeek] {
        &self.days
    }

    /// Period count of `day`; 0 for a Saturday that is not part of the week.
    pub fn periods_for(&self, day: DayOfWeek) -> usize {
        match day {
            DayOfWeek::Sat => self.saturday_periods,
            _ => self.weekday_periods,
        }
    }

    pub fn contains(&self, slot: Slot) -> bool {
        slot.period < self.periods_for(slot.day)
    }

    /// Whether a two-period block starting at `period` would straddle a break.
    pub fn crosses_break(&self, period: usize) -> bool {
        self.breaks_after.iter().any(|&b| period + 1 == b)
    }

    /// `period` and `period + 1` both exist on `day` and no break lies between them.
    pub fn fits_double(&self, day: DayOfWeek, period: usize) -> bool {
        period + 1 < self.periods_for(day) && !self.crosses_break(period)
    }

    pub fn previous_day(&self, day: DayOfWeek) -> Option<DayOfWeek> {
        let i = self.days.iter().position(|&d| d == day)?;
        i.checked_sub(1).map(|j| self.days[j])
    }

    pub fn next_day(&self, day: DayOfWeek) -> Option<DayOfWeek> {
        let i = self.days.iter().position(|&d| d == day)?;
        self.days.get(i + 1).copied()
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.days
            .iter()
            .flat_map(move |&d| (0..self.periods_for(d)).map(move |p| Slot::new(d, p)))
    }
}
