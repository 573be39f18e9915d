use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sched_core::audit::audit;
use sched_core::{CancelFlag, ConfigError, Generator};
use serde_json::json;
use timetable_engine::TimetableEngine;
use types::{GenerateRequest, GenerateResult, SlotContent, TeacherId};

fn physics_lab_request() -> GenerateRequest {
    serde_json::from_value(json!({
        "config": {
            "weekdayPeriods": 6,
            "saturdayPeriods": 0,
            "labs": [{
                "name": "Physics Lab",
                "frequency": 1,
                "requiredTeacherCount": 1,
                "teacherPool": ["t1", "t2"],
                "roomPool": ["r1"]
            }]
        },
        "faculty": [{ "teacherId": "t1" }, { "teacherId": "t2" }],
        "rooms": [{ "labId": "r1", "labName": "Physics" }],
        "branch": { "sections": 1 },
        "params": { "seed": 11 }
    }))
    .unwrap()
}

fn run(req: &GenerateRequest, seed: u64) -> GenerateResult {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    TimetableEngine::new()
        .generate_with_rng(req, &mut rng, &CancelFlag::new())
        .unwrap()
}

fn cohort_request() -> GenerateRequest {
    serde_json::from_value(json!({
        "config": {
            "weekdayPeriods": 7,
            "saturdayPeriods": 4,
            "shortBreakAfter": 2,
            "lunchBreakAfter": 4,
            "subjects": [
                {
                    "name": "Open Elective",
                    "frequency": 3,
                    "kind": "elective",
                    "options": [
                        { "name": "Economics", "teacherPool": ["e1"] },
                        { "name": "Psychology", "teacherPool": ["e2"] }
                    ]
                },
                { "name": "Maths", "frequency": 4, "teacherPool": ["m1", "m2"] }
            ],
            "labs": [
                {
                    "name": "Chemistry Lab",
                    "frequency": 1,
                    "teacherPool": ["c1", "c2", "c3"],
                    "roomPool": ["r1", "r2"],
                    "keepSameTeachers": true
                },
                {
                    "name": "Networks Lab",
                    "frequency": 1,
                    "sessionType": "batchWise",
                    "batchScheduleType": "samePeriod",
                    "numberOfBatches": 2,
                    "teacherPool": ["n1", "n2", "n3", "n4"],
                    "roomPool": ["r3", "r4"]
                },
                {
                    "name": "OS Lab",
                    "frequency": 1,
                    "sessionType": "batchWise",
                    "batchScheduleType": "differentPeriods",
                    "numberOfBatches": 3,
                    "teacherPool": ["o1", "o2", "o3"],
                    "roomPool": ["r5"]
                }
            ]
        },
        "faculty": [
            { "teacherId": "e1" }, { "teacherId": "e2" },
            { "teacherId": "m1" }, { "teacherId": "m2" },
            { "teacherId": "c1" }, { "teacherId": "c2" }, { "teacherId": "c3" },
            { "teacherId": "n1" }, { "teacherId": "n2" }, { "teacherId": "n3" }, { "teacherId": "n4" },
            { "teacherId": "o1" }, { "teacherId": "o2" }, { "teacherId": "o3" }
        ],
        "rooms": [
            { "labId": "r1" }, { "labId": "r2" }, { "labId": "r3" },
            { "labId": "r4" }, { "labId": "r5" }
        ],
        "branch": { "sections": 2, "sectionNames": ["CSE-A"] },
        "params": { "limits": { "placeRegularSubjects": true } }
    }))
    .unwrap()
}

#[test]
fn single_full_class_lab_is_placed() {
    let req = physics_lab_request();
    let res = run(&req, 3);
    assert!(res.success, "{:?}", res.error);
    assert_eq!(res.attempts, 1);

    let sections = res.section_timetables.as_ref().unwrap();
    let grid = &sections["A"];
    let cells: Vec<_> = grid
        .iter()
        .flat_map(|(day, periods)| {
            periods
                .iter()
                .enumerate()
                .filter_map(move |(p, c)| c.as_ref().map(|c| (*day, p, c)))
        })
        .collect();
    assert_eq!(cells.len(), 2);
    assert_eq!(cells[0].0, cells[1].0);
    assert_eq!(cells[0].1 + 1, cells[1].1);
    let SlotContent::Single(d) = cells[0].2 else {
        panic!("expected a single lab descriptor");
    };
    assert_eq!(d.name, "Physics Lab");
    assert_eq!(d.room_id, Some("r1".into()));

    let loads = res.faculty_allocations.as_ref().unwrap();
    let mut totals: Vec<u32> = loads.values().map(|e| e.total_assigned_periods).collect();
    totals.sort();
    assert_eq!(totals, vec![0, 2]);
    assert!(audit(&req.config, &res).is_empty());
}

#[test]
fn unavailable_room_exhausts_every_attempt() {
    let mut req = physics_lab_request();
    req.params.limits.max_attempts = 2;
    let closed = json!({ "unavailable": true, "message": "maintenance" });
    for day in ["Mon", "Tue", "Wed", "Thu", "Fri"] {
        for p in 1..=6 {
            req.rooms[0].unavailability.insert(
                format!("{day}-{p}"),
                serde_json::from_value(closed.clone()).unwrap(),
            );
        }
    }

    let res = run(&req, 3);
    assert!(!res.success);
    assert_eq!(res.attempts, 2);
    assert!(res.section_timetables.is_none());
    let err = res.error.unwrap();
    assert!(err.contains("placement exhausted"), "{err}");
    assert!(err.contains("Physics Lab"), "{err}");
}

#[test]
fn mixed_cohort_passes_audit() {
    let req = cohort_request();
    let res = run(&req, 42);
    assert!(res.success, "{:?}", res.error);
    let violations = audit(&req.config, &res);
    assert!(violations.is_empty(), "{violations:?}");

    let sections = res.section_timetables.as_ref().unwrap();
    let names: Vec<&String> = sections.keys().collect();
    assert_eq!(names, vec!["B", "CSE-A"]);

    // the elective block is shared: same slots in both sections
    let elective_slots = |name: &str| -> Vec<(String, usize)> {
        sections[name]
            .iter()
            .flat_map(|(day, periods)| {
                periods.iter().enumerate().filter_map(move |(p, c)| match c {
                    Some(SlotContent::Single(d)) if d.name == "Open Elective" => {
                        Some((day.to_string(), p))
                    }
                    _ => None,
                })
            })
            .collect()
    };
    assert_eq!(elective_slots("CSE-A").len(), 3);
    assert_eq!(elective_slots("CSE-A"), elective_slots("B"));

    // the elective teachers carry each cohort period once
    let loads = res.faculty_allocations.as_ref().unwrap();
    assert_eq!(loads[&TeacherId::from("e1")].total_assigned_periods, 3);
}

#[test]
fn repeated_pool_entries_are_booked_once() {
    let req: GenerateRequest = serde_json::from_value(json!({
        "config": {
            "weekdayPeriods": 6,
            "labs": [{
                "name": "Networks Lab",
                "frequency": 1,
                "sessionType": "batchWise",
                "batchScheduleType": "samePeriod",
                "numberOfBatches": 2,
                "teacherPool": ["t1", "t2", "t1"],
                "roomPool": ["r1", "r1"]
            }]
        },
        "branch": { "sections": 1 }
    }))
    .unwrap();
    let res = run(&req, 8);
    assert!(res.success, "{:?}", res.error);
    let violations = audit(&req.config, &res);
    assert!(violations.is_empty(), "{violations:?}");
    let loads = res.faculty_allocations.as_ref().unwrap();
    assert_eq!(loads[&TeacherId::from("t1")].total_assigned_periods, 2);
    assert_eq!(loads[&TeacherId::from("t2")].total_assigned_periods, 2);
}

#[test]
fn same_seed_same_timetable() {
    let req = cohort_request();
    let a = serde_json::to_value(run(&req, 9)).unwrap();
    let b = serde_json::to_value(run(&req, 9)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn configuration_errors_surface_before_any_attempt() {
    let mut req = physics_lab_request();
    req.config.weekday_periods = 0;
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let err = TimetableEngine::new()
        .generate_with_rng(&req, &mut rng, &CancelFlag::new())
        .unwrap_err();
    assert!(matches!(err, ConfigError::NoWeekdayPeriods));
}

#[test]
fn cancelled_run_makes_no_attempts() {
    let req = physics_lab_request();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let res = TimetableEngine::new()
        .generate_with_rng(&req, &mut rng, &cancel)
        .unwrap();
    assert!(!res.success);
    assert_eq!(res.attempts, 0);
    assert_eq!(res.error.as_deref(), Some("generation cancelled"));
}

#[tokio::test]
async fn generator_uses_request_seed() {
    let req = cohort_request();
    let mut seeded = req.clone();
    seeded.params.seed = Some(5);
    let engine = TimetableEngine::new();
    let a = engine.generate(seeded.clone(), CancelFlag::new()).await.unwrap();
    let b = engine.generate(seeded, CancelFlag::new()).await.unwrap();
    assert!(a.success);
    assert_eq!(
        serde_json::to_value(&a).unwrap(),
        serde_json::to_value(&b).unwrap()
    );

    let mut bad = req;
    bad.branch.sections = 0;
    let err = engine.generate(bad, CancelFlag::new()).await.unwrap_err();
    assert!(err.to_string().contains("no sections"));
}
