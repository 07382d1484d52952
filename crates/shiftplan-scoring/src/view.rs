//! Read-only views of the working schedule used by penalty rules.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, NaiveTime};
use smallvec::SmallVec;

use shiftplan_core::domain::window::{dates_between, month_key, next_month_start};
use shiftplan_core::domain::Resource;
use shiftplan_core::{AssignableUnit, DomainModel, EmployeeId, Stage, TimeWindow, UnitId};

/// Headcount required at one time point.
///
/// Attendance points sum every demand slot at the same date and time;
/// assignment points are per resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandPoint {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub resource: Option<Resource>,
    pub required: u32,
}

/// Lane of a resource on a date.
pub type LaneKey = (Resource, u32, NaiveDate);

/// Indices fixed for the lifetime of a schedule: they depend on unit
/// shapes, never on assignments.
#[derive(Debug, Default)]
pub struct StaticIndex {
    groups_of: Vec<SmallVec<[usize; 2]>>,
    lanes: HashMap<LaneKey, Vec<UnitId>>,
    points: Vec<DemandPoint>,
    cover: Vec<Vec<UnitId>>,
    unit_points: Vec<SmallVec<[usize; 4]>>,
}

impl StaticIndex {
    pub fn build(model: &DomainModel, stage: Stage, units: &[AssignableUnit]) -> Self {
        let mut groups_of: Vec<SmallVec<[usize; 2]>> = vec![SmallVec::new(); model.employees().len()];
        for (g, _) in model.groups().iter().enumerate() {
            for member in model.group_members(g) {
                groups_of[member.index()].push(g);
            }
        }

        let mut lanes: HashMap<LaneKey, Vec<UnitId>> = HashMap::new();
        for unit in units {
            if let Some(resource) = unit.resource() {
                lanes
                    .entry((resource.clone(), unit.lane(), unit.date()))
                    .or_default()
                    .push(unit.id);
            }
        }
        for lane in lanes.values_mut() {
            lane.sort_by_key(|id| (units[id.index()].window().start, *id));
        }

        let points = demand_points(model, stage);
        let mut cover = vec![Vec::new(); points.len()];
        let mut unit_points = vec![SmallVec::new(); units.len()];
        match stage {
            Stage::Attendance => {
                let mut by_date: HashMap<NaiveDate, Vec<&AssignableUnit>> = HashMap::new();
                for unit in units {
                    by_date.entry(unit.date()).or_default().push(unit);
                }
                for (idx, point) in points.iter().enumerate() {
                    for unit in by_date.get(&point.date).into_iter().flatten() {
                        if unit.window().contains_time(point.time) {
                            cover[idx].push(unit.id);
                            unit_points[unit.id.index()].push(idx);
                        }
                    }
                }
            }
            Stage::Assignment => {
                let mut by_start: HashMap<(NaiveDate, NaiveTime, &Resource), Vec<UnitId>> =
                    HashMap::new();
                for unit in units {
                    if let Some(resource) = unit.resource() {
                        by_start
                            .entry((unit.date(), unit.window().start, resource))
                            .or_default()
                            .push(unit.id);
                    }
                }
                for (idx, point) in points.iter().enumerate() {
                    let Some(resource) = &point.resource else {
                        continue;
                    };
                    if let Some(ids) = by_start.get(&(point.date, point.time, resource)) {
                        for id in ids {
                            cover[idx].push(*id);
                            unit_points[id.index()].push(idx);
                        }
                    }
                }
            }
        }

        Self {
            groups_of,
            lanes,
            points,
            cover,
            unit_points,
        }
    }

    /// Groups the employee is a member of.
    pub fn groups_of(&self, employee: EmployeeId) -> &[usize] {
        self.groups_of
            .get(employee.index())
            .map(|g| g.as_slice())
            .unwrap_or(&[])
    }

    /// Units of one lane, ordered by start time.
    pub fn lane(&self, key: &LaneKey) -> &[UnitId] {
        self.lanes.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn points(&self) -> &[DemandPoint] {
        &self.points
    }

    /// Units whose holder counts toward the point.
    pub fn cover(&self, point: usize) -> &[UnitId] {
        &self.cover[point]
    }

    /// Points a unit counts toward.
    pub fn unit_points(&self, unit: UnitId) -> &[usize] {
        self.unit_points
            .get(unit.index())
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }
}

/// Collapses demand slots into headcount points for a stage.
pub fn demand_points(model: &DomainModel, stage: Stage) -> Vec<DemandPoint> {
    let mut merged: BTreeMap<(NaiveDate, NaiveTime, Option<Resource>), u32> = BTreeMap::new();
    for slot in model.demand() {
        let resource = match stage {
            Stage::Attendance => None,
            Stage::Assignment => match &slot.resource {
                Some(r) => Some(r.clone()),
                None => continue,
            },
        };
        *merged.entry((slot.date, slot.time, resource)).or_default() += slot.required;
    }
    merged
        .into_iter()
        .map(|((date, time, resource), required)| DemandPoint {
            date,
            time,
            resource,
            required,
        })
        .collect()
}

/// Assignment-dependent index: who holds what on which date.
#[derive(Debug, Clone, Default)]
pub struct LiveIndex {
    by_day: HashMap<(EmployeeId, NaiveDate), SmallVec<[UnitId; 4]>>,
    counts: Vec<u32>,
}

impl LiveIndex {
    pub fn new(employee_count: usize) -> Self {
        Self {
            by_day: HashMap::new(),
            counts: vec![0; employee_count],
        }
    }

    pub fn from_units(units: &[AssignableUnit], employee_count: usize) -> Self {
        let mut live = Self::new(employee_count);
        for unit in units {
            if let Some(e) = unit.assigned {
                live.insert(e, unit.date(), unit.id);
            }
        }
        live
    }

    pub fn insert(&mut self, employee: EmployeeId, date: NaiveDate, unit: UnitId) {
        self.by_day.entry((employee, date)).or_default().push(unit);
        if let Some(c) = self.counts.get_mut(employee.index()) {
            *c += 1;
        }
    }

    pub fn remove(&mut self, employee: EmployeeId, date: NaiveDate, unit: UnitId) {
        if let Some(ids) = self.by_day.get_mut(&(employee, date)) {
            if let Some(pos) = ids.iter().position(|id| *id == unit) {
                ids.swap_remove(pos);
                if let Some(c) = self.counts.get_mut(employee.index()) {
                    *c -= 1;
                }
            }
            if ids.is_empty() {
                self.by_day.remove(&(employee, date));
            }
        }
    }

    pub fn units_on(&self, employee: EmployeeId, date: NaiveDate) -> &[UnitId] {
        self.by_day
            .get(&(employee, date))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Units held by the employee across the schedule.
    pub fn count(&self, employee: EmployeeId) -> u32 {
        self.counts.get(employee.index()).copied().unwrap_or(0)
    }
}

/// Everything a rule may read while evaluating a term.
#[derive(Clone, Copy)]
pub struct ScoreView<'a> {
    pub model: &'a DomainModel,
    pub units: &'a [AssignableUnit],
    pub statics: &'a StaticIndex,
    pub live: &'a LiveIndex,
}

impl<'a> ScoreView<'a> {
    pub fn unit(&self, id: UnitId) -> &'a AssignableUnit {
        &self.units[id.index()]
    }

    /// Windows the employee holds on a date, ordered by start.
    pub fn windows_on(&self, employee: EmployeeId, date: NaiveDate) -> SmallVec<[TimeWindow; 8]> {
        let mut windows: SmallVec<[TimeWindow; 8]> = self
            .live
            .units_on(employee, date)
            .iter()
            .map(|id| self.unit(*id).window())
            .collect();
        windows.sort();
        windows
    }

    /// True when a unit the employee holds on `date`, other than those in
    /// `except`, overlaps `window`.
    pub fn holds_overlapping(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        window: &TimeWindow,
        except: &[UnitId],
    ) -> bool {
        self.live
            .units_on(employee, date)
            .iter()
            .filter(|id| !except.contains(*id))
            .any(|id| self.unit(*id).window().overlaps(window))
    }

    pub fn minutes_on(&self, employee: EmployeeId, date: NaiveDate) -> i64 {
        self.live
            .units_on(employee, date)
            .iter()
            .map(|id| self.unit(*id).minutes())
            .sum()
    }

    /// True when the schedule gives the employee any unit on the date.
    pub fn works_on(&self, employee: EmployeeId, date: NaiveDate) -> bool {
        !self.live.units_on(employee, date).is_empty()
    }

    /// Schedule attendance inside the cycle, roster attendance outside it.
    pub fn attended(&self, employee: EmployeeId, date: NaiveDate) -> bool {
        if self.model.in_cycle(date) {
            self.works_on(employee, date)
        } else {
            self.model.attended_on_roster(employee, date)
        }
    }

    /// Minutes in the week starting `monday`, limited to the cycle.
    pub fn week_minutes(&self, employee: EmployeeId, monday: NaiveDate) -> i64 {
        self.cycle_dates_between(monday, monday + Duration::days(7))
            .map(|d| self.minutes_on(employee, d))
            .sum()
    }

    pub fn month_minutes(&self, employee: EmployeeId, month: (i32, u32)) -> i64 {
        self.cycle_dates_in_month(month)
            .map(|d| self.minutes_on(employee, d))
            .sum()
    }

    pub fn month_work_days(&self, employee: EmployeeId, month: (i32, u32)) -> u32 {
        self.cycle_dates_in_month(month)
            .filter(|d| self.works_on(employee, *d))
            .count() as u32
    }

    /// Cycle dates that fall in `month`.
    pub fn cycle_dates_in_month(&self, month: (i32, u32)) -> impl Iterator<Item = NaiveDate> + '_ {
        let first = NaiveDate::from_ymd_opt(month.0, month.1, 1);
        let (start, end) = match first {
            Some(first) => (first, next_month_start(first)),
            None => (self.model.cycle_start(), self.model.cycle_start()),
        };
        self.cycle_dates_between(start, end)
    }

    /// True when every day of `month` lies inside the cycle.
    pub fn month_fully_in_cycle(&self, month: (i32, u32)) -> bool {
        NaiveDate::from_ymd_opt(month.0, month.1, 1).is_some_and(|first| {
            first >= self.model.cycle_start() && next_month_start(first) <= self.model.cycle_end()
        })
    }

    /// True when the week starting `monday` lies inside the cycle and one month.
    pub fn week_fully_in_cycle(&self, monday: NaiveDate) -> bool {
        monday >= self.model.cycle_start()
            && monday + Duration::days(7) <= self.model.cycle_end()
            && month_key(monday) == month_key(monday + Duration::days(6))
    }

    fn cycle_dates_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + '_ {
        let start = start.max(self.model.cycle_start());
        let end = end.min(self.model.cycle_end());
        dates_between(start, end)
    }
}
