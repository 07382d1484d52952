//! Fluent construction of [`ProblemSnapshot`]s.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime, Weekday};
use shiftplan_core::domain::{
    AttendanceGroup, DemandSlot, Employee, EmployeePattern, EmployeeRequest, GroupRule,
    RegisterInfo, RegisterSkill, RequestKind, Resource, RosterEntry, TaskInfo, TaskSkill,
    WeeklyPreference, WorkLimits, WorkStyle,
};
use shiftplan_core::{DomainModel, ProblemKey, ProblemSnapshot, Stage, TimeWindow};

/// Builds a snapshot for one store; every employee belongs to that store.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: ProblemSnapshot,
}

impl SnapshotBuilder {
    pub fn new(store: &str, cycle_start: NaiveDate, stage: Stage) -> Self {
        Self {
            snapshot: ProblemSnapshot::new(ProblemKey::new(store, cycle_start, None, stage)),
        }
    }

    fn store(&self) -> String {
        self.snapshot.key.store_code.clone()
    }

    /// Scopes the key to `code` and registers it as a known department.
    pub fn department(mut self, code: &str) -> Self {
        self.snapshot.key.department_code = Some(code.to_string());
        if !self.snapshot.departments.iter().any(|d| d == code) {
            self.snapshot.departments.push(code.to_string());
        }
        self
    }

    pub fn cycle_end(mut self, end: NaiveDate) -> Self {
        self.snapshot.cycle_end = end;
        self
    }

    pub fn slot_minutes(mut self, minutes: i64) -> Self {
        self.snapshot.slot_minutes = minutes;
        self
    }

    pub fn employee(mut self, code: &str) -> Self {
        let store = self.store();
        self.snapshot.employees.push(Employee::new(code, store));
        self
    }

    pub fn employee_with_limits(mut self, code: &str, limits: WorkLimits) -> Self {
        let store = self.store();
        self.snapshot
            .employees
            .push(Employee::new(code, store).with_limits(limits));
        self
    }

    pub fn pattern(mut self, employee: &str, code: &str, window: TimeWindow, priority: u8) -> Self {
        self.snapshot
            .patterns
            .push(EmployeePattern::new(employee, code, window, priority));
        self
    }

    pub fn weekly(
        mut self,
        employee: &str,
        weekday: Weekday,
        style: WorkStyle,
        base_window: Option<TimeWindow>,
    ) -> Self {
        self.snapshot.weekly_preferences.push(WeeklyPreference {
            employee_code: employee.to_string(),
            weekday,
            style,
            base_window,
        });
        self
    }

    pub fn request(
        mut self,
        employee: &str,
        date: NaiveDate,
        kind: RequestKind,
        window: Option<TimeWindow>,
    ) -> Self {
        self.snapshot.requests.push(EmployeeRequest {
            employee_code: employee.to_string(),
            date,
            kind,
            window,
        });
        self
    }

    pub fn day_off(self, employee: &str, date: NaiveDate) -> Self {
        self.request(employee, date, RequestKind::Off, None)
    }

    pub fn prefer_on(self, employee: &str, date: NaiveDate, window: TimeWindow) -> Self {
        self.request(employee, date, RequestKind::PreferOn, Some(window))
    }

    pub fn group(mut self, id: &str, rule: GroupRule, members: &[&str]) -> Self {
        let store = self.store();
        self.snapshot.groups.push(AttendanceGroup {
            id: id.to_string(),
            store_code: store,
            department_code: None,
            rule,
            members: members.iter().map(|m| m.to_string()).collect::<BTreeSet<_>>(),
        });
        self
    }

    pub fn register_skill(mut self, employee: &str, register: u32, level: u8) -> Self {
        self.snapshot.register_skills.push(RegisterSkill {
            employee_code: employee.to_string(),
            register,
            level,
        });
        self
    }

    pub fn task_skill(mut self, employee: &str, code: &str, level: u8) -> Self {
        self.snapshot.task_skills.push(TaskSkill {
            employee_code: employee.to_string(),
            code: code.to_string(),
            level,
        });
        self
    }

    pub fn register(mut self, info: RegisterInfo) -> Self {
        self.snapshot.registers.push(info);
        self
    }

    pub fn task(mut self, code: &str, max_allowance_minutes: Option<i64>) -> Self {
        self.snapshot.tasks.push(TaskInfo {
            code: code.to_string(),
            max_allowance_minutes,
        });
        self
    }

    /// Demand on a resource at one slot.
    pub fn demand(
        mut self,
        date: NaiveDate,
        time: NaiveTime,
        resource: Option<Resource>,
        required: u32,
    ) -> Self {
        let store = self.store();
        let department_code = self.snapshot.key.department_code.clone();
        self.snapshot.demand.push(DemandSlot {
            store_code: store,
            date,
            time,
            department_code,
            resource,
            required,
        });
        self
    }

    /// Demand for every slot of `[from, to)` on `date`.
    pub fn demand_range(
        mut self,
        date: NaiveDate,
        range: TimeWindow,
        resource: Option<Resource>,
        required: u32,
    ) -> Self {
        let step = self.snapshot.slot_minutes;
        let mut t = range.start;
        while t < range.end {
            self = self.demand(date, t, resource.clone(), required);
            let next = t + chrono::Duration::minutes(step);
            if next <= t {
                break;
            }
            t = next;
        }
        self
    }

    pub fn roster(mut self, employee: &str, date: NaiveDate, window: TimeWindow) -> Self {
        self.snapshot.roster.push(RosterEntry {
            employee_code: employee.to_string(),
            date,
            window,
        });
        self
    }

    pub fn build(self) -> ProblemSnapshot {
        self.snapshot
    }

    /// Builds and validates the domain model; panics on invalid input.
    pub fn model(self) -> DomainModel {
        DomainModel::build(self.snapshot).expect("valid snapshot")
    }
}

/// Limits with only a daily cap.
pub fn daily_cap(minutes: i64) -> WorkLimits {
    WorkLimits {
        max_minutes_day: Some(minutes),
        ..WorkLimits::default()
    }
}
