//! shiftplan - staff rostering in two stages
//!
//! An ATTENDANCE job decides who works which window of each day; an
//! ASSIGNMENT job then places the attendees on registers and tasks. Both
//! run the same pipeline: unit generation, eligibility, a greedy
//! constructor and a local search over the incremental score.
//!
//! # Example
//!
//! ```rust
//! use shiftplan::prelude::*;
//!
//! let score = HardSoftScore::of(-1, -250);
//! assert!(!score.is_feasible());
//! assert!(HardSoftScore::of(0, -900) > score);
//! ```

pub mod logging;
mod solver;

pub use shiftplan_config::{
    AcceptorConfig, ConfigError, ConstructionConfig, EligibilityConfig, MoveConfig,
    ScoringConfig, SolverConfig, TerminationConfig,
};
pub use shiftplan_core::domain;
pub use shiftplan_core::{
    AssignableUnit, DomainModel, EmployeeId, HardSoftScore, JobId, ProblemKey, ProblemSnapshot,
    Result, Schedule, ShiftPlanError, Stage, TimeWindow, UnitId, UnitShape,
};
pub use shiftplan_scoring::{ConstraintAnalysis, IncrementalDirector, RuleSet, ScoreAnalysis};
pub use shiftplan_solver::{
    InMemoryStore, JobRegistry, JobResult, JobState, JobStatus, ProblemSource, ResultSink,
    ShiftSolver, ShiftSolverManager, SolveOutput,
};

pub use solver::{run_solver, SOLVER_CONFIG_FILE};

pub mod prelude {
    pub use super::domain::{AssignmentRow, AttendanceRow, Resource};
    pub use super::{
        HardSoftScore, InMemoryStore, JobState, JobStatus, ProblemKey, ProblemSnapshot,
        ShiftPlanError, ShiftSolverManager, SolverConfig, Stage,
    };
}

#[cfg(test)]
mod tests;
