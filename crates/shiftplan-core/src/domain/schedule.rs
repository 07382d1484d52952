//! The working solution of one job.

use super::{
    AssignableUnit, AssignmentRow, AttendanceRow, DomainModel, Stage, TimeWindow, UnitId,
    UnitShape,
};
use crate::score::HardSoftScore;

/// All assignable units of one stage plus the last known score.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    pub stage: Stage,
    pub units: Vec<AssignableUnit>,
    pub score: Option<HardSoftScore>,
}

impl Schedule {
    pub fn new(stage: Stage, units: Vec<AssignableUnit>) -> Self {
        Self {
            stage,
            units,
            score: None,
        }
    }

    pub fn unit(&self, id: UnitId) -> &AssignableUnit {
        &self.units[id.index()]
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn assigned_count(&self) -> usize {
        self.units.iter().filter(|u| u.assigned.is_some()).count()
    }

    pub fn pinned_count(&self) -> usize {
        self.units.iter().filter(|u| u.pinned).count()
    }

    /// One row per assigned attendance unit.
    pub fn attendance_rows(&self, model: &DomainModel) -> Vec<AttendanceRow> {
        let mut rows: Vec<AttendanceRow> = self
            .units
            .iter()
            .filter_map(|u| match (&u.shape, u.assigned) {
                (UnitShape::Attendance { date, window, .. }, Some(e)) => Some(AttendanceRow {
                    employee_code: model.employee(e).code.clone(),
                    date: *date,
                    window: *window,
                }),
                _ => None,
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.date, a.window.start, &a.employee_code).cmp(&(
                b.date,
                b.window.start,
                &b.employee_code,
            ))
        });
        rows
    }

    /// Assignment rows with back-to-back slots of one employee on one
    /// resource merged.
    pub fn assignment_rows(&self, model: &DomainModel) -> Vec<AssignmentRow> {
        let mut slots: Vec<(String, _, _, TimeWindow)> = self
            .units
            .iter()
            .filter_map(|u| match (&u.shape, u.assigned) {
                (
                    UnitShape::Assignment {
                        date,
                        window,
                        resource,
                        ..
                    },
                    Some(e),
                ) => Some((model.employee(e).code.clone(), resource.clone(), *date, *window)),
                _ => None,
            })
            .collect();
        slots.sort_by(|a, b| (&a.0, &a.1, a.2, a.3).cmp(&(&b.0, &b.1, b.2, b.3)));

        let mut rows: Vec<AssignmentRow> = Vec::new();
        for (employee_code, resource, date, window) in slots {
            if let Some(last) = rows.last_mut() {
                if last.employee_code == employee_code
                    && last.resource == resource
                    && last.date == date
                    && last.window.end == window.start
                {
                    last.window.end = window.end;
                    continue;
                }
            }
            rows.push(AssignmentRow {
                employee_code,
                resource,
                date,
                window,
            });
        }
        rows
    }
}
