//! Hard rules: any positive term makes the schedule infeasible.

use chrono::Duration;

use shiftplan_core::domain::window::{dates_between, month_key, week_start};
use shiftplan_core::{AssignableUnit, EmployeeId, ScoreLevel, UnitShape};

use super::PenaltyRule;
use crate::term::TermKey;
use crate::view::ScoreView;

/// The unit a `Unit` key names, with its holder.
fn unit_holder<'v>(key: &TermKey, view: &ScoreView<'v>) -> Option<(&'v AssignableUnit, EmployeeId)> {
    match key {
        TermKey::Unit(id) => {
            let unit = view.unit(*id);
            unit.assigned.map(|e| (unit, e))
        }
        _ => None,
    }
}

/// Mandatory unit left empty.
#[derive(Debug, Clone, Copy)]
pub struct UnassignedMandatory;

impl PenaltyRule for UnassignedMandatory {
    fn name(&self) -> &'static str {
        "unassigned_mandatory"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        _view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if employee.is_none() && unit.mandatory {
            out.push(TermKey::Unit(unit.id));
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        match key {
            TermKey::Unit(id) => {
                let unit = view.unit(*id);
                i64::from(unit.mandatory && unit.assigned.is_none())
            }
            _ => 0,
        }
    }
}

/// Overlapping windows held by one employee on one date, counted per pair.
#[derive(Debug, Clone, Copy)]
pub struct EmployeeOverlap;

impl PenaltyRule for EmployeeOverlap {
    fn name(&self) -> &'static str {
        "employee_overlap"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        _view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if let Some(e) = employee {
            out.push(TermKey::EmployeeDate(e, unit.date()));
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let TermKey::EmployeeDate(e, date) = key else {
            return 0;
        };
        let windows = view.windows_on(*e, *date);
        let mut pairs = 0;
        for (i, a) in windows.iter().enumerate() {
            // sorted by start: later windows starting at or after a.end never overlap a
            for b in &windows[i + 1..] {
                if b.start >= a.end {
                    break;
                }
                pairs += 1;
            }
        }
        pairs
    }
}

/// Two employees on overlapping units of the same resource lane.
///
/// Generated lanes are cut into disjoint slots, so this only fires for
/// hand-built or externally loaded units.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDoubleBooking;

impl PenaltyRule for ResourceDoubleBooking {
    fn name(&self) -> &'static str {
        "resource_double_booking"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        _view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if employee.is_some() {
            return;
        }
        if let Some(resource) = unit.resource() {
            out.push(TermKey::ResourceLane(resource.clone(), unit.lane(), unit.date()));
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let TermKey::ResourceLane(resource, lane, date) = key else {
            return 0;
        };
        let lane = view.statics.lane(&(resource.clone(), *lane, *date));
        let mut pairs = 0;
        for (i, a) in lane.iter().enumerate() {
            let a = view.unit(*a);
            let Some(ea) = a.assigned else { continue };
            for b in &lane[i + 1..] {
                let b = view.unit(*b);
                if b.window().start >= a.window().end {
                    break;
                }
                if b.assigned.is_some_and(|eb| eb != ea) {
                    pairs += 1;
                }
            }
        }
        pairs
    }
}

/// Work on a date with an off or paid_leave request.
#[derive(Debug, Clone, Copy)]
pub struct RequestedDayOff;

impl PenaltyRule for RequestedDayOff {
    fn name(&self) -> &'static str {
        "requested_day_off"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        _view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if employee.is_none() {
            out.push(TermKey::Unit(unit.id));
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        unit_holder(key, view)
            .map_or(0, |(unit, e)| i64::from(view.model.is_blocked(e, unit.date())))
    }
}

/// Work on a weekly OFF day or outside the weekday's base window.
#[derive(Debug, Clone, Copy)]
pub struct WeeklyOffOrOutsideBase;

impl PenaltyRule for WeeklyOffOrOutsideBase {
    fn name(&self) -> &'static str {
        "weekly_off_or_outside_base"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        _view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if employee.is_none() {
            out.push(TermKey::Unit(unit.id));
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        unit_holder(key, view).map_or(0, |(unit, e)| {
            i64::from(!view.model.weekly_permits(e, unit.date(), &unit.window()))
        })
    }
}

/// Attendance without a usable pattern, or an assignment slot outside
/// every roster window of the holder.
#[derive(Debug, Clone, Copy)]
pub struct PatternMismatch {
    pub min_priority: u8,
}

impl PenaltyRule for PatternMismatch {
    fn name(&self) -> &'static str {
        "pattern_mismatch"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        _view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if employee.is_none() {
            out.push(TermKey::Unit(unit.id));
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let Some((unit, e)) = unit_holder(key, view) else {
            return 0;
        };
        let window = unit.window();
        let matched = match unit.shape {
            UnitShape::Attendance { .. } => view
                .model
                .best_pattern_priority(e, &window, self.min_priority)
                .is_some(),
            UnitShape::Assignment { .. } => view.model.attending_during(e, unit.date(), &window),
        };
        i64::from(!matched)
    }
}

/// Holder rated below the qualifying level for the unit's resource or
/// department.
#[derive(Debug, Clone, Copy)]
pub struct SkillDisqualified {
    pub min_level: u8,
}

impl PenaltyRule for SkillDisqualified {
    fn name(&self) -> &'static str {
        "skill_disqualified"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        _view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if employee.is_none() {
            out.push(TermKey::Unit(unit.id));
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let Some((unit, e)) = unit_holder(key, view) else {
            return 0;
        };
        let level = match (unit.resource(), unit.department_code()) {
            (Some(resource), _) => view.model.skill_level(e, resource),
            (None, Some(dept)) => view.model.department_skill(e, dept),
            (None, None) => None,
        };
        i64::from(level.is_some_and(|l| l < self.min_level))
    }
}

/// Minutes over the daily cap.
#[derive(Debug, Clone, Copy)]
pub struct DailyMinutesCap {
    /// Cap for employees without their own.
    pub default_cap: i64,
}

impl PenaltyRule for DailyMinutesCap {
    fn name(&self) -> &'static str {
        "daily_minutes_cap"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        _view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if let Some(e) = employee {
            out.push(TermKey::EmployeeDate(e, unit.date()));
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let TermKey::EmployeeDate(e, date) = key else {
            return 0;
        };
        let cap = view
            .model
            .employee(*e)
            .limits
            .max_minutes_day
            .unwrap_or(self.default_cap);
        (view.minutes_on(*e, *date) - cap).max(0)
    }
}

/// Minutes over the employee's weekly cap.
#[derive(Debug, Clone, Copy)]
pub struct WeeklyMinutesCap;

impl PenaltyRule for WeeklyMinutesCap {
    fn name(&self) -> &'static str {
        "weekly_minutes_cap"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if let Some(e) = employee {
            if view.model.employee(e).limits.max_minutes_week.is_some() {
                out.push(TermKey::EmployeeWeek(e, week_start(unit.date())));
            }
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let TermKey::EmployeeWeek(e, monday) = key else {
            return 0;
        };
        view.model
            .employee(*e)
            .limits
            .max_minutes_week
            .map_or(0, |cap| (view.week_minutes(*e, *monday) - cap).max(0))
    }
}

/// Minutes over the employee's monthly cap.
#[derive(Debug, Clone, Copy)]
pub struct MonthlyMinutesCap;

impl PenaltyRule for MonthlyMinutesCap {
    fn name(&self) -> &'static str {
        "monthly_minutes_cap"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if let Some(e) = employee {
            if view.model.employee(e).limits.max_minutes_month.is_some() {
                out.push(TermKey::EmployeeMonth(e, month_key(unit.date())));
            }
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let TermKey::EmployeeMonth(e, month) = key else {
            return 0;
        };
        view.model
            .employee(*e)
            .limits
            .max_minutes_month
            .map_or(0, |cap| (view.month_minutes(*e, *month) - cap).max(0))
    }
}

/// Attended dates preceded by `cap` attended days, roster days included.
#[derive(Debug, Clone, Copy)]
pub struct ConsecutiveDays {
    pub cap: u32,
}

impl PenaltyRule for ConsecutiveDays {
    fn name(&self) -> &'static str {
        "consecutive_days"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        _view: &ScoreView<'_>,
        _unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if let Some(e) = employee {
            out.push(TermKey::Employee(e));
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let TermKey::Employee(e) = key else {
            return 0;
        };
        if self.cap == 0 {
            return 0;
        }
        let mut run = 0u32;
        let mut excess = 0;
        let lead_in = view.model.cycle_start() - Duration::days(i64::from(self.cap));
        for date in dates_between(lead_in, view.model.cycle_end()) {
            if view.attended(*e, date) {
                if run >= self.cap && view.model.in_cycle(date) {
                    excess += 1;
                }
                run += 1;
            } else {
                run = 0;
            }
        }
        excess
    }
}

/// Off days in a month of the cycle outside the employee's bounds.
#[derive(Debug, Clone, Copy)]
pub struct MonthlyOffDays;

impl MonthlyOffDays {
    fn bounded(view: &ScoreView<'_>, e: EmployeeId) -> bool {
        let limits = &view.model.employee(e).limits;
        limits.min_off_days_month.is_some() || limits.max_off_days_month.is_some()
    }
}

impl PenaltyRule for MonthlyOffDays {
    fn name(&self) -> &'static str {
        "monthly_off_days"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if let Some(e) = employee {
            if Self::bounded(view, e) {
                out.push(TermKey::EmployeeMonth(e, month_key(unit.date())));
            }
        }
    }

    fn global_terms(&self, view: &ScoreView<'_>, out: &mut Vec<TermKey>) {
        let mut months: Vec<(i32, u32)> = view.model.cycle_dates().map(month_key).collect();
        months.dedup();
        for e in view.model.employee_ids().filter(|e| Self::bounded(view, *e)) {
            for month in &months {
                out.push(TermKey::EmployeeMonth(e, *month));
            }
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let TermKey::EmployeeMonth(e, month) = key else {
            return 0;
        };
        let limits = &view.model.employee(*e).limits;
        let days = view.cycle_dates_in_month(*month).count() as i64;
        let off = days - i64::from(view.month_work_days(*e, *month));
        let short = limits
            .min_off_days_month
            .map_or(0, |min| (i64::from(min) - off).max(0));
        let over = limits
            .max_off_days_month
            .map_or(0, |max| (off - i64::from(max)).max(0));
        short + over
    }
}

/// Attendance-group rule violations per date.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceGroupRule;

impl PenaltyRule for AttendanceGroupRule {
    fn name(&self) -> &'static str {
        "attendance_group"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn unit_terms(
        &self,
        view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if let Some(e) = employee {
            for g in view.statics.groups_of(e) {
                out.push(TermKey::GroupDate(*g, unit.date()));
            }
        }
    }

    fn global_terms(&self, view: &ScoreView<'_>, out: &mut Vec<TermKey>) {
        for g in 0..view.model.groups().len() {
            for date in view.model.cycle_dates() {
                out.push(TermKey::GroupDate(g, date));
            }
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let TermKey::GroupDate(g, date) = key else {
            return 0;
        };
        let on_duty = view
            .model
            .group_members(*g)
            .iter()
            .filter(|m| view.works_on(**m, *date))
            .count();
        view.model.groups()[*g].violation(on_duty)
    }
}
