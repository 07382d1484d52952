//! Generation of assignable units from demand.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime};
use shiftplan_config::SolverConfig;
use shiftplan_core::domain::Resource;
use shiftplan_core::{AssignableUnit, DomainModel, Stage, TimeWindow, UnitId, UnitShape};
use tracing::{debug, warn};

/// Builds the unassigned units of the model's stage, numbered from zero.
///
/// Candidate sets are left empty; see
/// [`EligibilityEngine`](crate::EligibilityEngine).
pub fn build_units(model: &DomainModel, config: &SolverConfig) -> Vec<AssignableUnit> {
    let units = match model.stage() {
        Stage::Attendance => attendance_units(
            model,
            config.eligibility.min_pattern_priority,
            config.scoring.attendance_units_mandatory,
        ),
        Stage::Assignment => assignment_units(model),
    };
    debug!(
        event = "units_built",
        stage = %model.stage(),
        units = units.len(),
    );
    units
}

/// Distinct windows of usable patterns across all employees.
pub fn window_catalog(model: &DomainModel, min_priority: u8) -> Vec<TimeWindow> {
    model
        .employee_ids()
        .flat_map(|e| model.patterns(e))
        .filter(|p| p.is_usable(min_priority))
        .map(|p| p.window)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Headcount per date and time, summing every slot at the same instant.
fn headcount(model: &DomainModel) -> BTreeMap<NaiveDate, BTreeMap<NaiveTime, u32>> {
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<NaiveTime, u32>> = BTreeMap::new();
    for slot in model.demand() {
        *by_date
            .entry(slot.date)
            .or_default()
            .entry(slot.time)
            .or_default() += slot.required;
    }
    by_date
}

fn attendance_units(model: &DomainModel, min_priority: u8, mandatory: bool) -> Vec<AssignableUnit> {
    let catalog = window_catalog(model, min_priority);
    if catalog.is_empty() {
        warn!(
            event = "empty_catalog",
            key = %model.key(),
            "no usable shift pattern; attendance has no units"
        );
        return Vec::new();
    }
    let headcount = headcount(model);
    let department_code = model.key().department_code.clone();

    let mut units = Vec::new();
    for date in model.cycle_dates() {
        let Some(times) = headcount.get(&date) else {
            continue;
        };
        for window in &catalog {
            let replicas = times
                .range(window.start..window.end)
                .map(|(_, required)| *required)
                .max()
                .unwrap_or(0);
            for replica in 0..replicas {
                let shape = UnitShape::Attendance {
                    department_code: department_code.clone(),
                    date,
                    window: *window,
                    replica,
                };
                units.push(AssignableUnit::new(UnitId(units.len()), shape).with_mandatory(mandatory));
            }
        }
    }
    units
}

fn assignment_units(model: &DomainModel) -> Vec<AssignableUnit> {
    let mut slots: BTreeMap<(NaiveDate, Resource, NaiveTime), u32> = BTreeMap::new();
    for slot in model.demand() {
        if let Some(resource) = &slot.resource {
            *slots
                .entry((slot.date, resource.clone(), slot.time))
                .or_default() += slot.required;
        }
    }

    let minutes = model.slot_minutes();
    let mut units = Vec::new();
    for ((date, resource, time), required) in slots {
        let window = TimeWindow::starting_at(time, minutes);
        for lane in 0..required {
            let shape = UnitShape::Assignment {
                date,
                window,
                resource: resource.clone(),
                lane,
            };
            units.push(AssignableUnit::new(UnitId(units.len()), shape).with_mandatory(true));
        }
    }
    units
}
