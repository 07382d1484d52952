//! Validated, indexed domain model shared read-only by one solve.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::window::dates_between;
use super::{
    AttendanceGroup, DemandSlot, Employee, EmployeeId, EmployeePattern, ProblemKey,
    ProblemSnapshot, RegisterInfo, Resource, RequestKind, SkillMap, Stage, TaskInfo, TimeWindow,
    WeeklyPreference,
};
use crate::error::{Result, ShiftPlanError};

/// A prefer_on request resolved to an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferOn {
    pub employee: EmployeeId,
    pub date: NaiveDate,
    pub window: TimeWindow,
}

/// Indexed view of a [`ProblemSnapshot`].
///
/// Built once per solve and never mutated afterwards. References to
/// employee codes the snapshot does not list are dropped during the build.
#[derive(Debug)]
pub struct DomainModel {
    key: ProblemKey,
    cycle_start: NaiveDate,
    cycle_end: NaiveDate,
    slot_minutes: i64,
    employees: Vec<Employee>,
    by_code: HashMap<String, EmployeeId>,
    patterns: Vec<Vec<EmployeePattern>>,
    weekly: HashMap<(EmployeeId, Weekday), WeeklyPreference>,
    blocked: HashSet<(EmployeeId, NaiveDate)>,
    prefer_on: Vec<PreferOn>,
    groups: Vec<AttendanceGroup>,
    group_members: Vec<Vec<EmployeeId>>,
    skills: SkillMap,
    registers: Vec<RegisterInfo>,
    tasks: Vec<TaskInfo>,
    demand: Vec<DemandSlot>,
    roster_days: HashMap<EmployeeId, BTreeSet<NaiveDate>>,
    roster_windows: HashMap<(EmployeeId, NaiveDate), Vec<TimeWindow>>,
}

fn check_window(window: &TimeWindow, what: &str) -> Result<()> {
    if window.is_well_formed() {
        Ok(())
    } else {
        Err(ShiftPlanError::Validation(format!(
            "malformed window {} in {}",
            window, what
        )))
    }
}

impl DomainModel {
    /// Validates the snapshot and builds lookup indices.
    pub fn build(snapshot: ProblemSnapshot) -> Result<Self> {
        let key = snapshot.key;
        if key.store_code.trim().is_empty() {
            return Err(ShiftPlanError::Validation("missing store code".into()));
        }
        if let Some(dept) = &key.department_code {
            if !snapshot.departments.iter().any(|d| d == dept) {
                return Err(ShiftPlanError::Validation(format!(
                    "unknown department '{}' for store '{}'",
                    dept, key.store_code
                )));
            }
        }
        if snapshot.cycle_end <= key.cycle_start {
            return Err(ShiftPlanError::Validation(format!(
                "empty cycle {}..{}",
                key.cycle_start, snapshot.cycle_end
            )));
        }
        if snapshot.slot_minutes <= 0 {
            return Err(ShiftPlanError::Validation(format!(
                "zero-length demand slots ({} minutes)",
                snapshot.slot_minutes
            )));
        }

        let mut by_code = HashMap::with_capacity(snapshot.employees.len());
        for (idx, e) in snapshot.employees.iter().enumerate() {
            if by_code.insert(e.code.clone(), EmployeeId(idx)).is_some() {
                return Err(ShiftPlanError::Validation(format!(
                    "duplicate employee code '{}'",
                    e.code
                )));
            }
        }
        let lookup = |code: &str| by_code.get(code).copied();

        let mut patterns = vec![Vec::new(); snapshot.employees.len()];
        for p in snapshot.patterns {
            check_window(&p.window, "shift pattern")?;
            if let Some(id) = lookup(&p.employee_code) {
                patterns[id.index()].push(p);
            }
        }

        let mut weekly = HashMap::new();
        for w in snapshot.weekly_preferences {
            if let Some(base) = &w.base_window {
                check_window(base, "weekly preference")?;
            }
            if let Some(id) = lookup(&w.employee_code) {
                weekly.insert((id, w.weekday), w);
            }
        }

        let mut blocked = HashSet::new();
        let mut prefer_on = Vec::new();
        for r in snapshot.requests {
            let Some(id) = lookup(&r.employee_code) else {
                continue;
            };
            match r.kind {
                RequestKind::Off | RequestKind::PaidLeave => {
                    blocked.insert((id, r.date));
                }
                RequestKind::PreferOn => {
                    let window = r.window.ok_or_else(|| {
                        ShiftPlanError::Validation(format!(
                            "prefer_on request of '{}' on {} has no time window",
                            r.employee_code, r.date
                        ))
                    })?;
                    check_window(&window, "prefer_on request")?;
                    prefer_on.push(PreferOn {
                        employee: id,
                        date: r.date,
                        window,
                    });
                }
            }
        }

        let groups: Vec<AttendanceGroup> = snapshot
            .groups
            .into_iter()
            .filter(|g| g.store_code == key.store_code)
            .filter(|g| {
                g.department_code.is_none() || g.department_code == key.department_code
            })
            .collect();
        let group_members = groups
            .iter()
            .map(|g| g.members.iter().filter_map(|m| lookup(m)).collect())
            .collect();

        let demand: Vec<DemandSlot> = snapshot
            .demand
            .into_iter()
            .filter(|d| d.store_code == key.store_code)
            .filter(|d| d.date >= key.cycle_start && d.date < snapshot.cycle_end)
            .filter(|d| match (&key.department_code, &d.department_code) {
                (Some(want), Some(have)) => want == have,
                _ => true,
            })
            .collect();

        let mut roster_days: HashMap<EmployeeId, BTreeSet<NaiveDate>> = HashMap::new();
        let mut roster_windows: HashMap<(EmployeeId, NaiveDate), Vec<TimeWindow>> =
            HashMap::new();
        for entry in snapshot.roster {
            check_window(&entry.window, "roster entry")?;
            if let Some(id) = lookup(&entry.employee_code) {
                roster_days.entry(id).or_default().insert(entry.date);
                roster_windows
                    .entry((id, entry.date))
                    .or_default()
                    .push(entry.window);
            }
        }

        let skills = SkillMap::new(&snapshot.register_skills, &snapshot.task_skills);

        Ok(Self {
            cycle_start: key.cycle_start,
            key,
            cycle_end: snapshot.cycle_end,
            slot_minutes: snapshot.slot_minutes,
            employees: snapshot.employees,
            by_code,
            patterns,
            weekly,
            blocked,
            prefer_on,
            groups,
            group_members,
            skills,
            registers: snapshot.registers,
            tasks: snapshot.tasks,
            demand,
            roster_days,
            roster_windows,
        })
    }

    pub fn key(&self) -> &ProblemKey {
        &self.key
    }

    pub fn stage(&self) -> Stage {
        self.key.stage
    }

    pub fn cycle_start(&self) -> NaiveDate {
        self.cycle_start
    }

    /// Exclusive end of the cycle.
    pub fn cycle_end(&self) -> NaiveDate {
        self.cycle_end
    }

    pub fn cycle_dates(&self) -> impl Iterator<Item = NaiveDate> {
        dates_between(self.cycle_start, self.cycle_end)
    }

    pub fn in_cycle(&self, date: NaiveDate) -> bool {
        date >= self.cycle_start && date < self.cycle_end
    }

    pub fn slot_minutes(&self) -> i64 {
        self.slot_minutes
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee_ids(&self) -> impl Iterator<Item = EmployeeId> {
        (0..self.employees.len()).map(EmployeeId)
    }

    pub fn employee(&self, id: EmployeeId) -> &Employee {
        &self.employees[id.index()]
    }

    pub fn employee_id(&self, code: &str) -> Option<EmployeeId> {
        self.by_code.get(code).copied()
    }

    pub fn patterns(&self, id: EmployeeId) -> &[EmployeePattern] {
        &self.patterns[id.index()]
    }

    /// Highest priority among usable patterns whose window contains `window`.
    pub fn best_pattern_priority(
        &self,
        id: EmployeeId,
        window: &TimeWindow,
        min_priority: u8,
    ) -> Option<u8> {
        self.patterns(id)
            .iter()
            .filter(|p| p.is_usable(min_priority) && p.window.contains(window))
            .map(|p| p.priority)
            .max()
    }

    pub fn weekly_preference(&self, id: EmployeeId, date: NaiveDate) -> Option<&WeeklyPreference> {
        self.weekly.get(&(id, date.weekday()))
    }

    /// True when weekly preferences allow work in `window` on `date`.
    pub fn weekly_permits(&self, id: EmployeeId, date: NaiveDate, window: &TimeWindow) -> bool {
        self.weekly_preference(id, date)
            .map_or(true, |pref| pref.permits(window))
    }

    /// True when an off or paid_leave request covers the date.
    pub fn is_blocked(&self, id: EmployeeId, date: NaiveDate) -> bool {
        self.blocked.contains(&(id, date))
    }

    pub fn prefer_on_requests(&self) -> &[PreferOn] {
        &self.prefer_on
    }

    pub fn groups(&self) -> &[AttendanceGroup] {
        &self.groups
    }

    pub fn group_members(&self, group: usize) -> &[EmployeeId] {
        &self.group_members[group]
    }

    pub fn skills(&self) -> &SkillMap {
        &self.skills
    }

    pub fn skill_level(&self, id: EmployeeId, resource: &Resource) -> Option<u8> {
        self.skills.level(&self.employee(id).code, resource)
    }

    pub fn department_skill(&self, id: EmployeeId, department: &str) -> Option<u8> {
        self.skills.task_level(&self.employee(id).code, department)
    }

    pub fn registers(&self) -> &[RegisterInfo] {
        &self.registers
    }

    pub fn register(&self, number: u32) -> Option<&RegisterInfo> {
        self.registers.iter().find(|r| r.number == number)
    }

    pub fn tasks(&self) -> &[TaskInfo] {
        &self.tasks
    }

    /// Longest block one employee should hold on `resource`.
    pub fn max_allowance(&self, resource: &Resource) -> Option<i64> {
        match resource {
            Resource::Register(no) => self.register(*no).and_then(|r| r.max_allowance_minutes),
            Resource::Task(code) => self
                .tasks
                .iter()
                .find(|t| &t.code == code)
                .and_then(|t| t.max_allowance_minutes),
        }
    }

    /// Demand of the store within the cycle.
    pub fn demand(&self) -> &[DemandSlot] {
        &self.demand
    }

    pub fn attended_on_roster(&self, id: EmployeeId, date: NaiveDate) -> bool {
        self.roster_days
            .get(&id)
            .is_some_and(|days| days.contains(&date))
    }

    /// True when each of the `cap` days before `date` is a roster attendance day.
    pub fn roster_run_reaches(&self, id: EmployeeId, date: NaiveDate, cap: u32) -> bool {
        let Some(days) = self.roster_days.get(&id) else {
            return false;
        };
        cap > 0 && (1..=cap as i64).all(|back| days.contains(&(date - Duration::days(back))))
    }

    /// Roster windows of an employee on a date.
    pub fn roster_windows(&self, id: EmployeeId, date: NaiveDate) -> &[TimeWindow] {
        self.roster_windows
            .get(&(id, date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True when some roster window on `date` covers `window`.
    pub fn attending_during(&self, id: EmployeeId, date: NaiveDate, window: &TimeWindow) -> bool {
        self.roster_windows(id, date)
            .iter()
            .any(|w| w.contains(window))
    }
}
