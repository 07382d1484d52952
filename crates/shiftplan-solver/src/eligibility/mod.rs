//! Candidate sets for assignable units.
//!
//! Eligibility is computed once per solve, before construction, and stored
//! on each unit. Search never re-evaluates it.


use shiftplan_config::EligibilityConfig;
use shiftplan_core::domain::SkillMap;
use shiftplan_core::{
    AssignableUnit, DomainModel, EmployeeId, Result, ShiftPlanError, Stage, UnitShape,
};
use tracing::debug;

/// Decides which employees may fill a unit.
///
/// An employee is a candidate only when every check holds:
/// 1. no off or paid-leave request on the date
/// 2. the weekly preference allows work and its base window covers the unit
/// 3. attendance: a usable pattern covers the unit window;
///    assignment: a roster window on the date covers it
/// 4. the skill for the unit's department or resource is absent or qualifying
/// 5. the preceding run of roster attendance days is shorter than the cap
#[derive(Debug, Clone, Copy)]
pub struct EligibilityEngine<'a> {
    model: &'a DomainModel,
    config: &'a EligibilityConfig,
}

impl<'a> EligibilityEngine<'a> {
    pub fn new(model: &'a DomainModel, config: &'a EligibilityConfig) -> Self {
        Self { model, config }
    }

    /// Employees allowed to fill `unit`, sorted by employee index.
    pub fn candidates_for(&self, unit: &AssignableUnit) -> Vec<EmployeeId> {
        self.model
            .employee_ids()
            .filter(|e| self.is_candidate(*e, unit))
            .collect()
    }

    pub fn is_candidate(&self, employee: EmployeeId, unit: &AssignableUnit) -> bool {
        let model = self.model;
        let date = unit.date();
        let window = unit.window();

        if model.is_blocked(employee, date) {
            return false;
        }
        if !model.weekly_permits(employee, date, &window) {
            return false;
        }
        let skill = match &unit.shape {
            UnitShape::Attendance {
                department_code, ..
            } => {
                if model
                    .best_pattern_priority(employee, &window, self.config.min_pattern_priority)
                    .is_none()
                {
                    return false;
                }
                department_code
                    .as_deref()
                    .and_then(|dept| model.department_skill(employee, dept))
            }
            UnitShape::Assignment { resource, .. } => {
                if !model.attending_during(employee, date, &window) {
                    return false;
                }
                model.skill_level(employee, resource)
            }
        };
        if !SkillMap::permits(skill, self.config.min_skill_level) {
            return false;
        }
        !model.roster_run_reaches(employee, date, self.config.max_consecutive_days)
    }

    /// Fills the candidate set of every unit of `stage`.
    ///
    /// A holder that is no longer a candidate is cleared.
    ///
    /// # Errors
    ///
    /// `InvalidState` when a unit belongs to the other stage.
    pub fn annotate(&self, stage: Stage, units: &mut [AssignableUnit]) -> Result<()> {
        let mut empty = 0usize;
        let mut total = 0usize;
        for unit in units.iter_mut() {
            let unit_stage = match unit.shape {
                UnitShape::Attendance { .. } => Stage::Attendance,
                UnitShape::Assignment { .. } => Stage::Assignment,
            };
            if unit_stage != stage {
                return Err(ShiftPlanError::InvalidState(format!(
                    "unit {} is an {} unit in an {} solve",
                    unit.id, unit_stage, stage
                )));
            }
            unit.candidates = self.candidates_for(unit);
            if !unit.accepts(unit.assigned) {
                unit.assigned = None;
            }
            if unit.candidates.is_empty() {
                empty += 1;
            }
            total += unit.candidates.len();
        }
        debug!(
            event = "eligibility_done",
            stage = %stage,
            units = units.len(),
            without_candidates = empty,
            candidate_links = total,
        );
        Ok(())
    }
}
