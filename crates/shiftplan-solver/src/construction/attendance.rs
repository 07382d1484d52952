//! Randomized greedy constructor for the attendance stage.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rand::Rng;
use shiftplan_config::SolverConfig;
use shiftplan_core::domain::window::{month_key, week_start};
use shiftplan_core::domain::{WorkLimits, WorkStyle};
use shiftplan_core::{DomainModel, EmployeeId, Result, TimeWindow, UnitId, UnitShape};
use shiftplan_scoring::IncrementalDirector;
use smallvec::SmallVec;
use tracing::{info, warn};

use super::{ConstructionSummary, Constructor};

/// Pins prefer_on requests, then lets each employee attend free dates at
/// random, preferring their highest-priority pattern windows.
#[derive(Debug, Clone)]
pub struct AttendanceConstructor {
    attend_probability: f64,
    min_pattern_priority: u8,
    max_consecutive_days: u32,
    default_daily_cap: i64,
}

impl AttendanceConstructor {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            attend_probability: config.construction.attend_probability,
            min_pattern_priority: config.eligibility.min_pattern_priority,
            max_consecutive_days: config.eligibility.max_consecutive_days,
            default_daily_cap: config.scoring.default_max_daily_minutes,
        }
    }

    /// Assigns and pins one unit per prefer_on request. Returns the number
    /// of requests that found no unit.
    fn pin_requests(
        &self,
        director: &mut IncrementalDirector,
        ledger: &mut Ledger,
    ) -> Result<usize> {
        let model = Arc::clone(director.shared_model());
        let mut skipped = 0;
        for request in model.prefer_on_requests() {
            let employee = request.employee;
            let taken = ledger.overlaps(employee, request.date, &request.window);
            let found = director
                .units()
                .iter()
                .find(|u| {
                    !taken
                        && matches!(u.shape, UnitShape::Attendance { .. })
                        && !u.pinned
                        && u.date() == request.date
                        && u.window() == request.window
                        && u.candidates.binary_search(&employee).is_ok()
                        && u.assigned.map_or(true, |holder| holder == employee)
                })
                .map(|u| u.id);

            let Some(unit) = found else {
                skipped += 1;
                warn!(
                    event = "prefer_on_skipped",
                    employee = %model.employee(employee).code,
                    date = %request.date,
                    window = %request.window,
                    "no free eligible unit matches the request"
                );
                continue;
            };
            director.begin_change(unit).commit(Some(employee))?;
            director.pin(unit)?;
            ledger.record(employee, request.date, request.window);
        }
        Ok(skipped)
    }

    /// True when each of the preceding `cap` days is already an attendance day.
    fn run_reaches(
        &self,
        model: &DomainModel,
        ledger: &Ledger,
        employee: EmployeeId,
        date: NaiveDate,
    ) -> bool {
        let cap = self.max_consecutive_days;
        cap > 0
            && (1..=i64::from(cap)).all(|back| {
                let day = date - Duration::days(back);
                if model.in_cycle(day) {
                    ledger.attending(employee, day)
                } else {
                    model.attended_on_roster(employee, day)
                }
            })
    }
}

impl Constructor for AttendanceConstructor {
    fn construct<R: Rng>(
        &self,
        director: &mut IncrementalDirector,
        rng: &mut R,
    ) -> Result<ConstructionSummary> {
        let model = Arc::clone(director.shared_model());
        let mut ledger = Ledger::default();
        let skipped = self.pin_requests(director, &mut ledger)?;

        let mut by_date: BTreeMap<NaiveDate, Vec<UnitId>> = BTreeMap::new();
        for unit in director.units() {
            by_date.entry(unit.date()).or_default().push(unit.id);
        }

        for employee in model.employee_ids() {
            let usable = model
                .patterns(employee)
                .iter()
                .any(|p| p.is_usable(self.min_pattern_priority));
            if !usable {
                continue;
            }
            let limits = &model.employee(employee).limits;

            for (date, ids) in &by_date {
                let date = *date;
                let weekly_off = model
                    .weekly_preference(employee, date)
                    .is_some_and(|p| p.style == WorkStyle::Off);
                if weekly_off
                    || ledger.attending(employee, date)
                    || self.run_reaches(&model, &ledger, employee, date)
                {
                    continue;
                }
                if !rng.random_bool(self.attend_probability) {
                    continue;
                }

                let mut best: Option<u8> = None;
                let mut options: SmallVec<[UnitId; 8]> = SmallVec::new();
                for id in ids {
                    let unit = director.unit(*id);
                    if unit.pinned
                        || unit.assigned.is_some()
                        || unit.candidates.binary_search(&employee).is_err()
                    {
                        continue;
                    }
                    let Some(priority) = model.best_pattern_priority(
                        employee,
                        &unit.window(),
                        self.min_pattern_priority,
                    ) else {
                        continue;
                    };
                    match best {
                        Some(b) if priority < b => {}
                        Some(b) if priority == b => options.push(*id),
                        _ => {
                            best = Some(priority);
                            options.clear();
                            options.push(*id);
                        }
                    }
                }
                if options.is_empty() {
                    continue;
                }

                let pick = options[rng.random_range(0..options.len())];
                let window = director.unit(pick).window();
                if !ledger.fits(limits, self.default_daily_cap, employee, date, &window) {
                    continue;
                }
                director.begin_change(pick).commit(Some(employee))?;
                ledger.record(employee, date, window);
            }
        }

        let summary = ConstructionSummary::of(director, skipped);
        info!(
            event = "construction_end",
            stage = "ATTENDANCE",
            units = summary.units,
            assigned = summary.assigned,
            pinned = summary.pinned,
            skipped_requests = summary.skipped_requests,
            score = %director.score(),
        );
        Ok(summary)
    }
}

/// Running totals of what construction has handed out so far.
#[derive(Debug, Default)]
struct Ledger {
    windows: HashMap<(EmployeeId, NaiveDate), SmallVec<[TimeWindow; 2]>>,
    week: HashMap<(EmployeeId, NaiveDate), i64>,
    month: HashMap<(EmployeeId, (i32, u32)), i64>,
    month_days: HashMap<(EmployeeId, (i32, u32)), u32>,
    days: HashSet<(EmployeeId, NaiveDate)>,
}

impl Ledger {
    fn attending(&self, employee: EmployeeId, date: NaiveDate) -> bool {
        self.days.contains(&(employee, date))
    }

    fn overlaps(&self, employee: EmployeeId, date: NaiveDate, window: &TimeWindow) -> bool {
        self.windows
            .get(&(employee, date))
            .is_some_and(|ws| ws.iter().any(|w| w.overlaps(window)))
    }

    fn day_minutes(&self, employee: EmployeeId, date: NaiveDate) -> i64 {
        self.windows
            .get(&(employee, date))
            .map_or(0, |ws| ws.iter().map(TimeWindow::minutes).sum())
    }

    fn fits(
        &self,
        limits: &WorkLimits,
        default_daily_cap: i64,
        employee: EmployeeId,
        date: NaiveDate,
        window: &TimeWindow,
    ) -> bool {
        let minutes = window.minutes();
        let month = month_key(date);
        let daily_cap = limits.max_minutes_day.unwrap_or(default_daily_cap);
        if self.day_minutes(employee, date) + minutes > daily_cap {
            return false;
        }
        let week = self
            .week
            .get(&(employee, week_start(date)))
            .copied()
            .unwrap_or(0);
        if limits.max_minutes_week.is_some_and(|cap| week + minutes > cap) {
            return false;
        }
        let month_minutes = self.month.get(&(employee, month)).copied().unwrap_or(0);
        if limits
            .max_minutes_month
            .is_some_and(|cap| month_minutes + minutes > cap)
        {
            return false;
        }
        let days = self.month_days.get(&(employee, month)).copied().unwrap_or(0);
        !limits.max_work_days_month.is_some_and(|cap| days >= cap)
    }

    fn record(&mut self, employee: EmployeeId, date: NaiveDate, window: TimeWindow) {
        let minutes = window.minutes();
        let month = month_key(date);
        self.windows.entry((employee, date)).or_default().push(window);
        *self.week.entry((employee, week_start(date))).or_default() += minutes;
        *self.month.entry((employee, month)).or_default() += minutes;
        if self.days.insert((employee, date)) {
            *self.month_days.entry((employee, month)).or_default() += 1;
        }
    }
}
