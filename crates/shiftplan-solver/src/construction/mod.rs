//! Initial solution constructors.
//!
//! Constructors fill an empty schedule greedily through the director's
//! change transactions. They never fail on infeasibility: a unit nobody can
//! take stays empty and the score says so.

mod assignment;
mod attendance;


use std::fmt::Debug;

use rand::Rng;
use shiftplan_config::SolverConfig;
use shiftplan_core::{Result, Stage};
use shiftplan_scoring::IncrementalDirector;

pub use assignment::AssignmentConstructor;
pub use attendance::AttendanceConstructor;

/// What a constructor did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstructionSummary {
    /// Units in the schedule.
    pub units: usize,
    /// Units holding an employee afterwards.
    pub assigned: usize,
    /// Units pinned by the constructor.
    pub pinned: usize,
    /// Preference requests that found no unit.
    pub skipped_requests: usize,
}

/// Fills a schedule before local search.
pub trait Constructor: Send + Debug {
    /// Assigns units through `director`, drawing randomness from `rng` only.
    fn construct<R: Rng>(
        &self,
        director: &mut IncrementalDirector,
        rng: &mut R,
    ) -> Result<ConstructionSummary>;
}

/// Runs the constructor matching `stage`.
pub fn construct<R: Rng>(
    stage: Stage,
    config: &SolverConfig,
    director: &mut IncrementalDirector,
    rng: &mut R,
) -> Result<ConstructionSummary> {
    match stage {
        Stage::Attendance => AttendanceConstructor::new(config).construct(director, rng),
        Stage::Assignment => AssignmentConstructor::new(config).construct(director, rng),
    }
}

impl ConstructionSummary {
    pub(crate) fn of(director: &IncrementalDirector, skipped_requests: usize) -> Self {
        let schedule = director.schedule();
        Self {
            units: schedule.len(),
            assigned: schedule.assigned_count(),
            pinned: schedule.pinned_count(),
            skipped_requests,
        }
    }
}
