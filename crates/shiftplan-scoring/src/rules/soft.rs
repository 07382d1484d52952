//! Soft rules: quality objectives, weights from configuration.

use chrono::Duration;

use shiftplan_core::domain::window::{month_key, week_start};
use shiftplan_core::{AssignableUnit, EmployeeId, ScoreLevel, TimeWindow};

use super::PenaltyRule;
use crate::term::TermKey;
use crate::view::ScoreView;

/// Staffing against demand at every demand point.
#[derive(Debug, Clone, Copy)]
pub struct HeadcountBalance {
    pub balance_weight: i64,
    pub overstaff_weight: i64,
    /// Extra weight per required head when nobody covers the point.
    pub uncovered_weight: i64,
}

impl PenaltyRule for HeadcountBalance {
    fn name(&self) -> &'static str {
        "headcount_balance"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Soft
    }

    fn unit_terms(
        &self,
        view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if employee.is_none() {
            out.extend(view.statics.unit_points(unit.id).iter().map(|p| TermKey::Demand(*p)));
        }
    }

    fn global_terms(&self, view: &ScoreView<'_>, out: &mut Vec<TermKey>) {
        out.extend((0..view.statics.points().len()).map(TermKey::Demand));
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let TermKey::Demand(idx) = key else {
            return 0;
        };
        let required = i64::from(view.statics.points()[*idx].required);
        let covered = view
            .statics
            .cover(*idx)
            .iter()
            .filter(|id| view.unit(**id).assigned.is_some())
            .count() as i64;
        let mut penalty = if covered < required {
            (required - covered) * 2 * self.balance_weight
        } else {
            (covered - required) * (self.balance_weight + self.overstaff_weight)
        };
        if covered == 0 && required > 0 {
            penalty += self.uncovered_weight * 2 * required;
        }
        penalty
    }
}

/// Squared unit count per employee, favouring an even spread.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadBalance {
    pub weight: i64,
}

impl PenaltyRule for WorkloadBalance {
    fn name(&self) -> &'static str {
        "workload_balance"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Soft
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
        let count = i64::from(view.live.count(*e));
        self.weight * count * count
    }
}

/// Merges sorted windows whose gaps are at most `gap` minutes.
fn blocks(windows: &[TimeWindow], gap: i64) -> Vec<TimeWindow> {
    let mut merged: Vec<TimeWindow> = Vec::with_capacity(windows.len());
    for w in windows {
        match merged.last_mut() {
            Some(last) if (w.start - last.end).num_minutes() <= gap => {
                last.end = last.end.max(w.end);
            }
            _ => merged.push(*w),
        }
    }
    merged
}

/// Work of one day split into separate blocks.
#[derive(Debug, Clone, Copy)]
pub struct Fragmentation {
    pub weight: i64,
    pub gap_minutes: i64,
}

impl PenaltyRule for Fragmentation {
    fn name(&self) -> &'static str {
        "fragmentation"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Soft
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
        if windows.len() < 2 {
            return 0;
        }
        let count = blocks(&windows, self.gap_minutes).len() as i64;
        (count - 1) * self.weight
    }
}

/// Long working day without a break near its middle.
#[derive(Debug, Clone, Copy)]
pub struct MissingBreak {
    pub weight: i64,
    pub threshold_minutes: i64,
    pub break_minutes: i64,
}

impl PenaltyRule for MissingBreak {
    fn name(&self) -> &'static str {
        "missing_break"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Soft
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
        if view.minutes_on(*e, *date) < self.threshold_minutes {
            return 0;
        }
        let merged = blocks(&view.windows_on(*e, *date), 0);
        let (Some(first), Some(last)) = (merged.first(), merged.last()) else {
            return 0;
        };
        let quarter = Duration::minutes((last.end - first.start).num_minutes() / 4);
        let middle = TimeWindow::new(first.start + quarter, last.end - quarter);
        let has_break = merged.windows(2).any(|pair| {
            let gap = TimeWindow::new(pair[0].end, pair[1].start);
            gap.minutes() >= self.break_minutes && gap.overlaps(&middle)
        });
        if has_break {
            0
        } else {
            self.weight
        }
    }
}

/// Work days over the monthly maximum.
#[derive(Debug, Clone, Copy)]
pub struct MonthlyWorkDays {
    pub weight: i64,
}

impl PenaltyRule for MonthlyWorkDays {
    fn name(&self) -> &'static str {
        "monthly_work_days"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Soft
    }

    fn unit_terms(
        &self,
        view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if let Some(e) = employee {
            if view.model.employee(e).limits.max_work_days_month.is_some() {
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
            .max_work_days_month
            .map_or(0, |max| {
                let days = view.month_work_days(*e, *month);
                i64::from(days.saturating_sub(max)) * self.weight
            })
    }
}

/// Adjacent slots of one lane handed from one employee to another.
#[derive(Debug, Clone, Copy)]
pub struct HandoffChurn {
    pub weight: i64,
}

impl PenaltyRule for HandoffChurn {
    fn name(&self) -> &'static str {
        "handoff_churn"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Soft
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
        let handoffs = lane
            .windows(2)
            .filter(|pair| {
                let (a, b) = (view.unit(pair[0]), view.unit(pair[1]));
                a.window().end == b.window().start
                    && matches!((a.assigned, b.assigned), (Some(x), Some(y)) if x != y)
            })
            .count() as i64;
        handoffs * self.weight
    }
}

/// One weight per employee working a date, so each day is staffed by as few
/// distinct people as the demand allows.
#[derive(Debug, Clone, Copy)]
pub struct DailyWorkers {
    pub weight: i64,
}

impl PenaltyRule for DailyWorkers {
    fn name(&self) -> &'static str {
        "daily_workers"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Soft
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
        if view.works_on(*e, *date) {
            self.weight
        } else {
            0
        }
    }
}

/// Attendance in a window whose best pattern priority is below the top.
#[derive(Debug, Clone, Copy)]
pub struct PatternPriority {
    pub weight: i64,
    pub max_priority: u8,
    pub min_priority: u8,
}

impl PenaltyRule for PatternPriority {
    fn name(&self) -> &'static str {
        "pattern_priority"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Soft
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
        let TermKey::Unit(id) = key else {
            return 0;
        };
        let unit = view.unit(*id);
        let Some(e) = unit.assigned else {
            return 0;
        };
        view.model
            .best_pattern_priority(e, &unit.window(), self.min_priority)
            .map_or(0, |best| {
                i64::from(self.max_priority.saturating_sub(best)) * self.weight
            })
    }
}

/// Weekly and monthly minutes below the employee's minimum.
///
/// Only weeks inside a single month of the cycle and months fully inside
/// the cycle are judged.
#[derive(Debug, Clone, Copy)]
pub struct MinutesShortfall {
    pub weight: i64,
}

impl MinutesShortfall {
    fn keys(view: &ScoreView<'_>, e: EmployeeId, date: chrono::NaiveDate, out: &mut Vec<TermKey>) {
        let limits = &view.model.employee(e).limits;
        let monday = week_start(date);
        if limits.min_minutes_week.is_some() && view.week_fully_in_cycle(monday) {
            out.push(TermKey::EmployeeWeek(e, monday));
        }
        let month = month_key(date);
        if limits.min_minutes_month.is_some() && view.month_fully_in_cycle(month) {
            out.push(TermKey::EmployeeMonth(e, month));
        }
    }
}

impl PenaltyRule for MinutesShortfall {
    fn name(&self) -> &'static str {
        "minutes_shortfall"
    }

    fn level(&self) -> ScoreLevel {
        ScoreLevel::Soft
    }

    fn unit_terms(
        &self,
        view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    ) {
        if let Some(e) = employee {
            Self::keys(view, e, unit.date(), out);
        }
    }

    fn global_terms(&self, view: &ScoreView<'_>, out: &mut Vec<TermKey>) {
        for e in view.model.employee_ids() {
            for date in view.model.cycle_dates() {
                Self::keys(view, e, date, out);
            }
        }
    }

    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64 {
        let limits = match key {
            TermKey::EmployeeWeek(e, _) | TermKey::EmployeeMonth(e, _) => {
                &view.model.employee(*e).limits
            }
            _ => return 0,
        };
        let short = match key {
            TermKey::EmployeeWeek(e, monday) => limits
                .min_minutes_week
                .map_or(0, |min| (min - view.week_minutes(*e, *monday)).max(0)),
            TermKey::EmployeeMonth(e, month) => limits
                .min_minutes_month
                .map_or(0, |min| (min - view.month_minutes(*e, *month)).max(0)),
            _ => 0,
        };
        short * self.weight
    }
}
