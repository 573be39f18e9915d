use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            Deserialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Hash,
            PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(TeacherId);
id_newtype!(RoomId);

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, PartialOrd, Ord,
)]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayOfWeek {
    pub const WEEKDAYS: [DayOfWeek; 5] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
    ];

    /// Position in the week, `Mon = 0`. Indexes `LoadEntry::per_day_assigned`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Mon => "Mon",
            DayOfWeek::Tue => "Tue",
            DayOfWeek::Wed => "Wed",
            DayOfWeek::Thu => "Thu",
            DayOfWeek::Fri => "Fri",
            DayOfWeek::Sat => "Sat",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mon" => Ok(DayOfWeek::Mon),
            "Tue" => Ok(DayOfWeek::Tue),
            "Wed" => Ok(DayOfWeek::Wed),
            "Thu" => Ok(DayOfWeek::Thu),
            "Fri" => Ok(DayOfWeek::Fri),
            "Sat" => Ok(DayOfWeek::Sat),
            other => Err(format!("unknown day: {other}")),
        }
    }
}

/// A (day, period) coordinate. `period` is 0-based; external keys are 1-based.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, PartialOrd, Ord,
)]
pub struct Slot {
    pub day: DayOfWeek,
    pub period: usize,
}

impl Slot {
    pub fn new(day: DayOfWeek, period: usize) -> Self {
        Self { day, period }
    }

    /// External `"Day-Period"` key, e.g. `Slot::new(Mon, 0).key() == "Mon-1"`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.day, self.period + 1)
    }

    pub fn parse_key(key: &str) -> Option<Slot> {
        let (day, period) = key.split_once('-')?;
        let day = day.trim().parse::<DayOfWeek>().ok()?;
        let period = period.trim().parse::<usize>().ok()?;
        if period == 0 {
            return None;
        }
        Some(Slot::new(day, period - 1))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRecord {
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub allocated: bool,
    #[serde(default)]
    pub message: String,
}

impl AvailabilityRecord {
    pub fn allocated(message: impl Into<String>) -> Self {
        Self {
            unavailable: true,
            allocated: true,
            message: message.into(),
        }
    }
}

/// Availability keyed by `"Day-Period"`.
pub type AvailabilityMap = BTreeMap<String, AvailabilityRecord>;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    pub teacher_id: TeacherId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub unavailability: AvailabilityMap,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabRoom {
    pub lab_id: RoomId,
    #[serde(default)]
    pub lab_name: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub unavailability: AvailabilityMap,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub sections: u32,
    #[serde(default)]
    pub section_names: Vec<String>,
}

impl Branch {
    /// One name per section; missing names default to `A`, `B`, ... by index.
    pub fn resolved_section_names(&self) -> Vec<String> {
        (0..self.sections as usize)
            .map(|i| match self.section_names.get(i) {
                Some(name) if !name.trim().is_empty() => name.clone(),
                _ => default_section_name(i),
            })
            .collect()
    }
}

fn default_section_name(index: usize) -> String {
    let mut n = index;
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    name
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SubjectKind {
    #[default]
    Regular,
    Elective,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElectiveOption {
    pub name: String,
    #[serde(default)]
    pub teacher_pool: Vec<TeacherId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub frequency: u32,
    #[serde(default)]
    pub kind: SubjectKind,
    /// Candidate teachers of a regular subject.
    #[serde(default)]
    pub teacher_pool: Vec<TeacherId>,
    /// Options of an elective block.
    #[serde(default)]
    pub options: Vec<ElectiveOption>,
}

impl Subject {
    pub fn is_elective(&self) -> bool {
        self.kind == SubjectKind::Elective
    }

    /// Every teacher across every option, first occurrence order, no repeats.
    pub fn all_option_teachers(&self) -> Vec<TeacherId> {
        let mut out: Vec<TeacherId> = Vec::new();
        for t in self.options.iter().flat_map(|o| o.teacher_pool.iter()) {
            if !out.contains(t) {
                out.push(t.clone());
            }
        }
        out
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LabSessionType {
    #[default]
    FullClass,
    BatchWise,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BatchScheduleType {
    #[default]
    SamePeriod,
    DifferentPeriods,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lab {
    pub name: String,
    pub frequency: u32,
    #[serde(default = "one")]
    pub required_teacher_count: u32,
    #[serde(default)]
    pub teacher_pool: Vec<TeacherId>,
    #[serde(default)]
    pub session_type: LabSessionType,
    #[serde(default)]
    pub batch_schedule_type: Option<BatchScheduleType>,
    #[serde(default = "one")]
    pub number_of_batches: u32,
    #[serde(default)]
    pub room_pool: Vec<RoomId>,
    #[serde(default)]
    pub keep_same_teachers: bool,
}

fn one() -> u32 {
    1
}

/// Which placement stage owns a lab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabPlacement {
    FullClass,
    SamePeriod,
    DifferentPeriods,
}

impl Lab {
    pub fn placement(&self) -> LabPlacement {
        match (self.session_type, self.batch_schedule_type.unwrap_or_default()) {
            (LabSessionType::FullClass, _) => LabPlacement::FullClass,
            (LabSessionType::BatchWise, BatchScheduleType::SamePeriod) => LabPlacement::SamePeriod,
            (LabSessionType::BatchWise, BatchScheduleType::DifferentPeriods) => {
                LabPlacement::DifferentPeriods
            }
        }
    }

    /// Sessions a section must receive: `frequency`, times batches for batch-wise labs.
    pub fn expected_sessions(&self) -> u32 {
        match self.session_type {
            LabSessionType::FullClass => self.frequency,
            LabSessionType::BatchWise => self.frequency.saturating_mul(self.number_of_batches),
        }
    }
}

pub fn batch_label(batch: u32) -> String {
    format!("Batch {batch}")
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimetableConfig {
    pub weekday_periods: u32,
    #[serde(default)]
    pub saturday_periods: u32,
    /// Break sits after this 1-based period; 0 means none.
    #[serde(default)]
    pub short_break_after: u32,
    #[serde(default)]
    pub lunch_break_after: u32,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub labs: Vec<Lab>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    Elective,
    Lab,
    Regular,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub name: String,
    pub kind: SessionKind,
    pub teacher_ids: Vec<TeacherId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum SlotContent {
    Single(SessionDescriptor),
    Batches(Vec<SessionDescriptor>),
}

impl SlotContent {
    pub fn sessions(&self) -> &[SessionDescriptor] {
        match self {
            SlotContent::Single(s) => std::slice::from_ref(s),
            SlotContent::Batches(v) => v,
        }
    }
}

pub type SectionTimetable = BTreeMap<DayOfWeek, Vec<Option<SlotContent>>>;

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadEntry {
    pub total_assigned_periods: u32,
    #[schema(value_type = Vec<u32>)]
    pub per_day_assigned: [u32; 6],
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineLimits {
    #[serde(default = "EngineLimits::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "EngineLimits::default_elective_draws")]
    pub elective_draws: u32,
    #[serde(default = "EngineLimits::default_day_cap_relax_after")]
    pub elective_day_cap_relax_after: u32,
    #[serde(default = "EngineLimits::default_lab_outer_attempts")]
    pub lab_outer_attempts: u32,
    #[serde(default = "EngineLimits::default_lab_inner_attempts")]
    pub lab_inner_attempts: u32,
    #[serde(default = "EngineLimits::default_batch_draw_ceiling")]
    pub batch_draw_ceiling: u32,
    #[serde(default = "EngineLimits::default_max_cluster_size")]
    pub max_cluster_size: u32,
    #[serde(default)]
    pub place_regular_subjects: bool,
}

impl EngineLimits {
    fn default_max_attempts() -> u32 {
        1000
    }
    fn default_elective_draws() -> u32 {
        100
    }
    fn default_day_cap_relax_after() -> u32 {
        30
    }
    fn default_lab_outer_attempts() -> u32 {
        100
    }
    fn default_lab_inner_attempts() -> u32 {
        200
    }
    fn default_batch_draw_ceiling() -> u32 {
        2000
    }
    fn default_max_cluster_size() -> u32 {
        4
    }
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            elective_draws: Self::default_elective_draws(),
            elective_day_cap_relax_after: Self::default_day_cap_relax_after(),
            lab_outer_attempts: Self::default_lab_outer_attempts(),
            lab_inner_attempts: Self::default_lab_inner_attempts(),
            batch_draw_ceiling: Self::default_batch_draw_ceiling(),
            max_cluster_size: Self::default_max_cluster_size(),
            place_regular_subjects: false,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub limits: EngineLimits,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub config: TimetableConfig,
    #[serde(default)]
    pub faculty: Vec<Faculty>,
    #[serde(default)]
    pub rooms: Vec<LabRoom>,
    pub branch: Branch,
    #[serde(default)]
    pub params: GenerateParams,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub section_timetables: Option<BTreeMap<String, SectionTimetable>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty_allocations: Option<BTreeMap<TeacherId, LoadEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub teacher_availability: Option<BTreeMap<TeacherId, AvailabilityMap>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub room_availability: Option<BTreeMap<RoomId, AvailabilityMap>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
}

impl GenerateResult {
    pub fn succeeded(
        section_timetables: BTreeMap<String, SectionTimetable>,
        faculty_allocations: BTreeMap<TeacherId, LoadEntry>,
        teacher_availability: BTreeMap<TeacherId, AvailabilityMap>,
        room_availability: BTreeMap<RoomId, AvailabilityMap>,
        attempts: u32,
    ) -> Self {
        Self {
            success: true,
            section_timetables: Some(section_timetables),
            faculty_allocations: Some(faculty_allocations),
            teacher_availability: Some(teacher_availability),
            room_availability: Some(room_availability),
            error: None,
            attempts,
        }
    }

    pub fn failed(error: impl Into<String>, attempts: u32) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            attempts,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Violation {
    pub r#type: String,
    pub details: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_keys_are_one_based() {
        let s = Slot::new(DayOfWeek::Wed, 0);
        assert_eq!(s.key(), "Wed-1");
        assert_eq!(Slot::parse_key("Wed-1"), Some(s));
        assert_eq!(Slot::parse_key("Sat-6"), Some(Slot::new(DayOfWeek::Sat, 5)));
        assert_eq!(Slot::parse_key("Wed-0"), None);
        assert_eq!(Slot::parse_key("Sun-1"), None);
        assert_eq!(Slot::parse_key("Mon"), None);
    }

    #[test]
    fn section_names_fall_back_to_letters() {
        let b = Branch {
            sections: 3,
            section_names: vec!["CSE-A".into()],
        };
        assert_eq!(b.resolved_section_names(), vec!["CSE-A", "B", "C"]);
        assert_eq!(default_section_name(26), "AA");
    }

    #[test]
    fn elective_teachers_are_flattened_without_repeats() {
        let s = Subject {
            name: "OE".into(),
            frequency: 2,
            kind: SubjectKind::Elective,
            teacher_pool: vec![],
            options: vec![
                ElectiveOption {
                    name: "AI".into(),
                    teacher_pool: vec!["t1".into(), "t2".into()],
                },
                ElectiveOption {
                    name: "IoT".into(),
                    teacher_pool: vec!["t2".into(), "t3".into()],
                },
            ],
        };
        let all: Vec<String> = s.all_option_teachers().into_iter().map(|t| t.0).collect();
        assert_eq!(all, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn request_defaults_fill_limits() {
        let req: GenerateRequest = serde_json::from_value(serde_json::json!({
            "config": {
                "weekdayPeriods": 6,
                "labs": [{
                    "name": "DBMS Lab",
                    "frequency": 1,
                    "teacherPool": ["t1"],
                    "sessionType": "batchWise",
                    "batchScheduleType": "differentPeriods",
                    "numberOfBatches": 2
                }]
            },
            "branch": { "sections": 1 }
        }))
        .unwrap();
        assert_eq!(req.params.limits.max_attempts, 1000);
        assert_eq!(req.params.limits.lab_inner_attempts, 200);
        assert!(!req.params.limits.place_regular_subjects);
        let lab = &req.config.labs[0];
        assert_eq!(lab.placement(), LabPlacement::DifferentPeriods);
        assert_eq!(lab.required_teacher_count, 1);
        assert_eq!(lab.expected_sessions(), 2);
    }

    #[test]
    fn slot_content_serialises_untagged() {
        let d = SessionDescriptor {
            name: "OS Lab".into(),
            kind: SessionKind::Lab,
            teacher_ids: vec!["t1".into()],
            room_id: None,
            batch: Some(batch_label(1)),
        };
        let v = serde_json::to_value(SlotContent::Batches(vec![d.clone()])).unwrap();
        assert!(v.is_array());
        assert_eq!(v[0]["batch"], "Batch 1");
        let v = serde_json::to_value(SlotContent::Single(d)).unwrap();
        assert_eq!(v["kind"], "lab");
        assert!(v.get("roomId").is_none());
    }
}
