//! Per-attempt teacher and room slot state.
//!
//! A slot can take a new session only while `unavailable == false`. Reserving
//! marks it `unavailable + allocated` and hands back a [`Reservation`] holding
//! the record it replaced; releasing that reservation restores the record
//! exactly. Callers reserve only slots they have checked free.

use std::collections::{BTreeMap, HashMap};
use types::{AvailabilityMap, AvailabilityRecord, Faculty, LabRoom, RoomId, Slot, TeacherId};

type SlotStates = HashMap<Slot, AvailabilityRecord>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AvailabilityRegistry {
    teachers: HashMap<TeacherId, SlotStates>,
    rooms: HashMap<RoomId, SlotStates>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Holder {
    Teacher(TeacherId),
    Room(RoomId),
}

#[derive(Clone, Debug)]
#[must_use = "a reservation must be kept for rollback"]
pub struct Reservation {
    holder: Holder,
    slot: Slot,
    prior: Option<AvailabilityRecord>,
}

fn parse_states(map: &AvailabilityMap) -> SlotStates {
    map.iter()
        .filter_map(|(k, rec)| Slot::parse_key(k).map(|s| (s, rec.clone())))
        .collect()
}

fn free(states: Option<&SlotStates>, slot: Slot) -> bool {
    states
        .and_then(|m| m.get(&slot))
        .map_or(true, |rec| !rec.unavailable)
}

fn export(states: &SlotStates) -> AvailabilityMap {
    states.iter().map(|(s, rec)| (s.key(), rec.clone())).collect()
}

impl AvailabilityRegistry {
    pub fn from_inputs(faculty: &[Faculty], rooms: &[LabRoom]) -> Self {
        Self {
            teachers: faculty
                .iter()
                .map(|f| (f.teacher_id.clone(), parse_states(&f.unavailability)))
                .collect(),
            rooms: rooms
                .iter()
                .map(|r| (r.lab_id.clone(), parse_states(&r.unavailability)))
                .collect(),
        }
    }

    /// Adds empty state for teachers and rooms the curriculum names but the
    /// inputs never listed, so they show up in the exported maps.
    pub fn register<'a>(
        &mut self,
        teachers: impl IntoIterator<Item = &'a TeacherId>,
        rooms: impl IntoIterator<Item = &'a RoomId>,
    ) {
        for t in teachers {
            self.teachers.entry(t.clone()).or_default();
        }
        for r in rooms {
            self.rooms.entry(r.clone()).or_default();
        }
    }

    pub fn is_teacher_free(&self, id: &TeacherId, slot: Slot) -> bool {
        free(self.teachers.get(id), slot)
    }

    pub fn is_room_free(&self, id: &RoomId, slot: Slot) -> bool {
        free(self.rooms.get(id), slot)
    }

    pub fn teachers_free(&self, ids: &[TeacherId], slots: &[Slot]) -> bool {
        ids.iter()
            .all(|t| slots.iter().all(|&s| self.is_teacher_free(t, s)))
    }

    pub fn reserve_teacher(&mut self, id: &TeacherId, slot: Slot, message: &str) -> Reservation {
        debug_assert!(self.is_teacher_free(id, slot), "{id} already taken at {}", slot.key());
        let prior = self
            .teachers
            .entry(id.clone())
            .or_default()
            .insert(slot, AvailabilityRecord::allocated(message));
        Reservation {
            holder: Holder::Teacher(id.clone()),
            slot,
            prior,
        }
    }

    pub fn reserve_room(&mut self, id: &RoomId, slot: Slot, message: &str) -> Reservation {
        debug_assert!(self.is_room_free(id, slot), "{id} already taken at {}", slot.key());
        let prior = self
            .rooms
            .entry(id.clone())
            .or_default()
            .insert(slot, AvailabilityRecord::allocated(message));
        Reservation {
            holder: Holder::Room(id.clone()),
            slot,
            prior,
        }
    }

    pub fn release(&mut self, r: Reservation) {
        let states = match &r.holder {
            Holder::Teacher(id) => self.teachers.get_mut(id),
            Holder::Room(id) => self.rooms.get_mut(id),
        };
        let Some(states) = states else {
            return;
        };
        match r.prior {
            Some(prior) => {
                states.insert(r.slot, prior);
            }
            None => {
                states.remove(&r.slot);
            }
        }
    }

    pub fn teacher_map(&self) -> BTreeMap<TeacherId, AvailabilityMap> {
        self.teachers
            .iter()
            .map(|(id, states)| (id.clone(), export(states)))
            .collect()
    }

    pub fn room_map(&self) -> BTreeMap<RoomId, AvailabilityMap> {
        self.rooms
            .iter()
            .map(|(id, states)| (id.clone(), export(states)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::DayOfWeek;

    fn registry() -> AvailabilityRegistry {
        let mut busy = AvailabilityMap::new();
        busy.insert(
            "Mon-1".into(),
            AvailabilityRecord {
                unavailable: true,
                allocated: false,
                message: "department meeting".into(),
            },
        );
        busy.insert(
            "Mon-2".into(),
            AvailabilityRecord {
                unavailable: false,
                allocated: false,
                message: "prefers not".into(),
            },
        );
        let faculty = vec![Faculty {
            teacher_id: "t1".into(),
            name: "Dr. Rao".into(),
            unavailability: busy,
        }];
        let rooms = vec![LabRoom {
            lab_id: "r1".into(),
            lab_name: "Chem".into(),
            room_number: "101".into(),
            building: "Main".into(),
            unavailability: AvailabilityMap::new(),
        }];
        AvailabilityRegistry::from_inputs(&faculty, &rooms)
    }

    #[test]
    fn unavailable_flag_decides_freedom() {
        let reg = registry();
        let t1 = TeacherId::from("t1");
        assert!(!reg.is_teacher_free(&t1, Slot::new(DayOfWeek::Mon, 0)));
        assert!(reg.is_teacher_free(&t1, Slot::new(DayOfWeek::Mon, 1)));
        assert!(reg.is_teacher_free(&"unknown".into(), Slot::new(DayOfWeek::Mon, 0)));
    }

    #[test]
    fn release_restores_prior_record() {
        let mut reg = registry();
        let before = reg.clone();
        let t1 = TeacherId::from("t1");
        let r1 = RoomId::from("r1");
        let a = reg.reserve_teacher(&t1, Slot::new(DayOfWeek::Mon, 1), "A: Chem Lab");
        let b = reg.reserve_teacher(&t1, Slot::new(DayOfWeek::Tue, 3), "A: Chem Lab");
        let c = reg.reserve_room(&r1, Slot::new(DayOfWeek::Tue, 3), "A: Chem Lab");
        assert!(!reg.is_teacher_free(&t1, Slot::new(DayOfWeek::Mon, 1)));
        assert!(!reg.is_room_free(&r1, Slot::new(DayOfWeek::Tue, 3)));
        assert_eq!(reg.teacher_map()[&t1]["Tue-4"], AvailabilityRecord::allocated("A: Chem Lab"));

        for r in [c, b, a] {
            reg.release(r);
        }
        assert_eq!(reg, before);
        assert_eq!(reg.teacher_map()[&t1]["Mon-2"].message, "prefers not");
    }
}
