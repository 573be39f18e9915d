//! Post-hoc checks of a finished timetable.
//!
//! Elective blocks are cohort-wide: the same elective at the same slot in
//! several sections is one session taught once, so it is counted once for
//! double-booking and load purposes.

use crate::Calendar;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use types::{
    DayOfWeek, GenerateResult, SectionTimetable, SessionDescriptor, SessionKind, SubjectKind,
    TimetableConfig, Violation,
};

fn violation(kind: &str, details: serde_json::Value) -> Violation {
    Violation {
        r#type: kind.into(),
        details,
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum SessionKey<'a> {
    Cohort(&'a str),
    Local(&'a str, usize),
}

pub fn audit(cfg: &TimetableConfig, result: &GenerateResult) -> Vec<Violation> {
    let mut out = Vec::new();
    let cal = match Calendar::from_config(cfg) {
        Ok(c) => c,
        Err(e) => return vec![violation("invalid_config", json!({ "error": e.to_string() }))],
    };
    let Some(sections) = result.section_timetables.as_ref() else {
        return out;
    };

    for (name, tt) in sections {
        check_shape(&cal, name, tt, &mut out);
        check_labs(cfg, &cal, name, tt, &mut out);
        check_subjects(cfg, name, tt, &mut out);
    }

    let mut teacher_periods: HashMap<&str, u32> = HashMap::new();
    for day in cal.days().iter().copied() {
        for period in 0..cal.periods_for(day) {
            let mut sessions: HashMap<SessionKey<'_>, &SessionDescriptor> = HashMap::new();
            let mut local = 0usize;
            for (section, tt) in sections {
                let Some(Some(content)) = tt.get(&day).and_then(|v| v.get(period)) else {
                    continue;
                };
                for s in content.sessions() {
                    let key = match s.kind {
                        SessionKind::Elective => SessionKey::Cohort(s.name.as_str()),
                        _ => {
                            local += 1;
                            SessionKey::Local(section.as_str(), local)
                        }
                    };
                    sessions.insert(key, s);
                }
            }

            let mut teachers: HashMap<&str, u32> = HashMap::new();
            let mut rooms: HashMap<&str, u32> = HashMap::new();
            for s in sessions.values() {
                for t in &s.teacher_ids {
                    *teachers.entry(t.0.as_str()).or_default() += 1;
                    *teacher_periods.entry(t.0.as_str()).or_default() += 1;
                }
                if let Some(r) = &s.room_id {
                    *rooms.entry(r.0.as_str()).or_default() += 1;
                }
            }
            let slot = types::Slot::new(day, period).key();
            for (t, n) in teachers.into_iter().filter(|(_, n)| *n > 1) {
                out.push(violation(
                    "teacher_double_booked",
                    json!({ "teacher": t, "slot": slot, "sessions": n }),
                ));
            }
            for (r, n) in rooms.into_iter().filter(|(_, n)| *n > 1) {
                out.push(violation(
                    "room_double_booked",
                    json!({ "room": r, "slot": slot, "sessions": n }),
                ));
            }
        }
    }

    if let Some(alloc) = result.faculty_allocations.as_ref() {
        for (teacher, entry) in alloc {
            let per_day: u32 = entry.per_day_assigned.iter().sum();
            if per_day != entry.total_assigned_periods {
                out.push(violation(
                    "load_inconsistent",
                    json!({ "teacher": teacher.0, "total": entry.total_assigned_periods, "perDaySum": per_day }),
                ));
            }
            let seen = teacher_periods.get(teacher.0.as_str()).copied().unwrap_or(0);
            if seen != entry.total_assigned_periods {
                out.push(violation(
                    "load_mismatch",
                    json!({ "teacher": teacher.0, "recorded": entry.total_assigned_periods, "scheduled": seen }),
                ));
            }
        }
        for (teacher, seen) in &teacher_periods {
            if !alloc.keys().any(|k| k.0 == *teacher) {
                out.push(violation(
                    "load_mismatch",
                    json!({ "teacher": teacher, "recorded": 0, "scheduled": seen }),
                ));
            }
        }
    }

    out
}

fn check_shape(cal: &Calendar, section: &str, tt: &SectionTimetable, out: &mut Vec<Violation>) {
    for (day, cells) in tt {
        if !cal.days().contains(day) || cells.len() != cal.periods_for(*day) {
            out.push(violation(
                "grid_shape",
                json!({ "section": section, "day": day, "periods": cells.len() }),
            ));
        }
    }
}

/// Pairs each lab descriptor with an identical one in the next period; anything
/// left unpaired is a split lab.
fn check_labs(
    cfg: &TimetableConfig,
    cal: &Calendar,
    section: &str,
    tt: &SectionTimetable,
    out: &mut Vec<Violation>,
) {
    let mut sessions: BTreeMap<&str, u32> = BTreeMap::new();
    for (day, cells) in tt {
        let mut open: Vec<&SessionDescriptor> = Vec::new();
        for (period, cell) in cells.iter().enumerate() {
            let labs: Vec<&SessionDescriptor> = cell
                .iter()
                .flat_map(|c| c.sessions())
                .filter(|s| s.kind == SessionKind::Lab)
                .collect();
            let mut next_open = Vec::new();
            for s in labs {
                if let Some(i) = open.iter().position(|o| *o == s) {
                    open.swap_remove(i);
                    *sessions.entry(s.name.as_str()).or_default() += 1;
                    if cal.crosses_break(period - 1) {
                        out.push(violation(
                            "lab_crosses_break",
                            json!({ "section": section, "lab": s.name, "day": day, "period": period }),
                        ));
                    }
                } else {
                    next_open.push(s);
                }
            }
            report_split(section, *day, period, &open, out);
            open = next_open;
        }
        report_split(section, *day, cells.len(), &open, out);
    }

    for lab in &cfg.labs {
        let placed = sessions.get(lab.name.as_str()).copied().unwrap_or(0);
        if placed != lab.expected_sessions() {
            out.push(violation(
                "lab_frequency",
                json!({ "section": section, "lab": lab.name, "placed": placed, "expected": lab.expected_sessions() }),
            ));
        }
    }
}

fn report_split(
    section: &str,
    day: DayOfWeek,
    period: usize,
    open: &[&SessionDescriptor],
    out: &mut Vec<Violation>,
) {
    for s in open {
        out.push(violation(
            "lab_not_contiguous",
            json!({ "section": section, "lab": s.name, "day": day, "period": period }),
        ));
    }
}

fn check_subjects(cfg: &TimetableConfig, section: &str, tt: &SectionTimetable, out: &mut Vec<Violation>) {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    let mut any_regular = false;
    for s in tt.values().flatten().flatten().flat_map(|c| c.sessions()) {
        match s.kind {
            SessionKind::Elective => *counts.entry(s.name.as_str()).or_default() += 1,
            SessionKind::Regular => {
                any_regular = true;
                *counts.entry(s.name.as_str()).or_default() += 1;
            }
            SessionKind::Lab => {}
        }
    }
    for subject in &cfg.subjects {
        if subject.kind == SubjectKind::Regular && !any_regular {
            continue;
        }
        let placed = counts.get(subject.name.as_str()).copied().unwrap_or(0);
        if placed != subject.frequency {
            out.push(violation(
                "subject_frequency",
                json!({ "section": section, "subject": subject.name, "placed": placed, "expected": subject.frequency }),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{LoadEntry, SlotContent, TeacherId};

    fn config() -> TimetableConfig {
        serde_json::from_value(json!({
            "weekdayPeriods": 4,
            "shortBreakAfter": 2,
            "labs": [{ "name": "Physics Lab", "frequency": 1, "teacherPool": ["t1"] }]
        }))
        .unwrap()
    }

    fn lab(teacher: &str) -> SlotContent {
        SlotContent::Single(SessionDescriptor {
            name: "Physics Lab".into(),
            kind: SessionKind::Lab,
            teacher_ids: vec![TeacherId(teacher.into())],
            room_id: None,
            batch: None,
        })
    }

    fn empty_grid(cal: &Calendar) -> SectionTimetable {
        cal.days()
            .iter()
            .map(|&d| (d, vec![None; cal.periods_for(d)]))
            .collect()
    }

    fn result(sections: Vec<(&str, SectionTimetable)>, load: Vec<(&str, u32)>) -> GenerateResult {
        let alloc = load
            .into_iter()
            .map(|(t, n)| {
                let mut e = LoadEntry::default();
                e.total_assigned_periods = n;
                e.per_day_assigned[0] = n;
                (TeacherId(t.into()), e)
            })
            .collect();
        GenerateResult::succeeded(
            sections.into_iter().map(|(n, g)| (n.to_string(), g)).collect(),
            alloc,
            Default::default(),
            Default::default(),
            1,
        )
    }

    #[test]
    fn clean_timetable_has_no_violations() {
        let cfg = config();
        let cal = Calendar::from_config(&cfg).unwrap();
        let mut g = empty_grid(&cal);
        let mon = g.get_mut(&DayOfWeek::Mon).unwrap();
        mon[2] = Some(lab("t1"));
        mon[3] = Some(lab("t1"));
        let v = audit(&cfg, &result(vec![("A", g)], vec![("t1", 2)]));
        assert!(v.is_empty(), "{v:?}");
    }

    #[test]
    fn flags_break_crossing_and_double_booking() {
        let cfg = config();
        let cal = Calendar::from_config(&cfg).unwrap();
        let mut a = empty_grid(&cal);
        let mut b = empty_grid(&cal);
        for g in [&mut a, &mut b] {
            let mon = g.get_mut(&DayOfWeek::Mon).unwrap();
            mon[1] = Some(lab("t1"));
            mon[2] = Some(lab("t1"));
        }
        let v = audit(&cfg, &result(vec![("A", a), ("B", b)], vec![("t1", 4)]));
        let kinds: Vec<&str> = v.iter().map(|x| x.r#type.as_str()).collect();
        assert!(kinds.contains(&"lab_crosses_break"));
        assert!(kinds.contains(&"teacher_double_booked"));
        assert!(!kinds.contains(&"load_mismatch"));
    }

    #[test]
    fn flags_split_lab_and_missing_frequency() {
        let cfg = config();
        let cal = Calendar::from_config(&cfg).unwrap();
        let mut g = empty_grid(&cal);
        g.get_mut(&DayOfWeek::Tue).unwrap()[0] = Some(lab("t1"));
        let v = audit(&cfg, &result(vec![("A", g)], vec![("t1", 1)]));
        let kinds: Vec<&str> = v.iter().map(|x| x.r#type.as_str()).collect();
        assert!(kinds.contains(&"lab_not_contiguous"));
        assert!(kinds.contains(&"lab_frequency"));
    }

    #[test]
    fn cohort_electives_count_once() {
        let cfg: TimetableConfig = serde_json::from_value(json!({
            "weekdayPeriods": 4,
            "subjects": [{
                "name": "Open Elective", "frequency": 1, "kind": "elective",
                "options": [{ "name": "AI", "teacherPool": ["t9"] }]
            }]
        }))
        .unwrap();
        let cal = Calendar::from_config(&cfg).unwrap();
        let block = SlotContent::Single(SessionDescriptor {
            name: "Open Elective".into(),
            kind: SessionKind::Elective,
            teacher_ids: vec![TeacherId("t9".into())],
            room_id: None,
            batch: None,
        });
        let mut a = empty_grid(&cal);
        let mut b = empty_grid(&cal);
        a.get_mut(&DayOfWeek::Wed).unwrap()[1] = Some(block.clone());
        b.get_mut(&DayOfWeek::Wed).unwrap()[1] = Some(block);
        let v = audit(&cfg, &result(vec![("A", a), ("B", b)], vec![("t9", 1)]));
        assert!(v.is_empty(), "{v:?}");
    }
}
