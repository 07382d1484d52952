//! Raw inputs for one solve, as supplied by a problem source.

use chrono::{Months, NaiveDate};

use super::{
    AttendanceGroup, DemandSlot, Employee, EmployeePattern, EmployeeRequest, ProblemKey,
    RegisterInfo, RegisterSkill, RosterEntry, TaskInfo, TaskSkill, WeeklyPreference,
};

/// Default demand resolution in minutes.
pub const DEFAULT_SLOT_MINUTES: i64 = 15;

/// Plain input data for one problem identity.
///
/// Converted into an indexed, validated [`DomainModel`](super::DomainModel)
/// before any solving starts.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProblemSnapshot {
    pub key: ProblemKey,
    /// Exclusive end of the cycle.
    pub cycle_end: NaiveDate,
    pub slot_minutes: i64,
    /// Department codes known for the store.
    pub departments: Vec<String>,
    pub employees: Vec<Employee>,
    pub patterns: Vec<EmployeePattern>,
    pub weekly_preferences: Vec<WeeklyPreference>,
    pub requests: Vec<EmployeeRequest>,
    pub groups: Vec<AttendanceGroup>,
    pub register_skills: Vec<RegisterSkill>,
    pub task_skills: Vec<TaskSkill>,
    pub registers: Vec<RegisterInfo>,
    pub tasks: Vec<TaskInfo>,
    pub demand: Vec<DemandSlot>,
    /// Existing committed attendance, used for consecutive-day checks and as
    /// the attendee list of the assignment stage.
    pub roster: Vec<RosterEntry>,
}

impl ProblemSnapshot {
    /// An empty snapshot covering one month from the key's cycle start.
    pub fn new(key: ProblemKey) -> Self {
        let cycle_end = key
            .cycle_start
            .checked_add_months(Months::new(1))
            .unwrap_or(key.cycle_start);
        Self {
            key,
            cycle_end,
            slot_minutes: DEFAULT_SLOT_MINUTES,
            departments: Vec::new(),
            employees: Vec::new(),
            patterns: Vec::new(),
            weekly_preferences: Vec::new(),
            requests: Vec::new(),
            groups: Vec::new(),
            register_skills: Vec::new(),
            task_skills: Vec::new(),
            registers: Vec::new(),
            tasks: Vec::new(),
            demand: Vec::new(),
            roster: Vec::new(),
        }
    }
}

impl Default for ProblemSnapshot {
    fn default() -> Self {
        Self::new(ProblemKey::new(
            String::new(),
            NaiveDate::default(),
            None,
            super::Stage::Attendance,
        ))
    }
}
