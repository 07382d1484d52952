//! Units built by hand, bypassing generation and eligibility.

use chrono::NaiveDate;
use shiftplan_core::domain::Resource;
use shiftplan_core::{AssignableUnit, EmployeeId, TimeWindow, UnitId, UnitShape};

fn sorted(mut candidates: Vec<EmployeeId>) -> Vec<EmployeeId> {
    candidates.sort();
    candidates.dedup();
    candidates
}

pub fn attendance_unit(
    id: usize,
    date: NaiveDate,
    window: TimeWindow,
    candidates: &[usize],
) -> AssignableUnit {
    let mut unit = AssignableUnit::new(
        UnitId(id),
        UnitShape::Attendance {
            department_code: None,
            date,
            window,
            replica: 0,
        },
    );
    unit.candidates = sorted(candidates.iter().copied().map(EmployeeId).collect());
    unit
}

/// A mandatory unit on `resource` lane `lane`.
pub fn assignment_unit(
    id: usize,
    date: NaiveDate,
    window: TimeWindow,
    resource: Resource,
    lane: u32,
    candidates: &[usize],
) -> AssignableUnit {
    let mut unit = AssignableUnit::new(
        UnitId(id),
        UnitShape::Assignment {
            date,
            window,
            resource,
            lane,
        },
    )
    .with_mandatory(true);
    unit.candidates = sorted(candidates.iter().copied().map(EmployeeId).collect());
    unit
}
