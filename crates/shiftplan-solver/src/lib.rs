//! shiftplan solver engine
//!
//! This crate provides:
//! - Eligibility: precomputed candidate sets per unit
//! - Unit generation for both stages
//! - Initial solution constructors (attendance and assignment)
//! - Local search with pluggable acceptors and terminations
//! - Job orchestration keyed by [`ProblemKey`](shiftplan_core::ProblemKey)
//!
//! [`ShiftSolver`] runs one solve end to end on the calling thread;
//! [`ShiftSolverManager`] runs solves as background jobs and persists
//! their results.

pub mod construction;
pub mod eligibility;
pub mod localsearch;
pub mod manager;
pub mod scope;
pub mod solver;
pub mod termination;
pub mod units;

pub use construction::{
    AssignmentConstructor, AttendanceConstructor, ConstructionSummary, Constructor,
};
pub use eligibility::EligibilityEngine;
pub use localsearch::{
    Acceptor, BestSolutionEvent, HillClimbingAcceptor, LateAcceptanceAcceptor, LocalSearch,
    MoveSelector, ScheduleMove, SearchOutcome, SimulatedAnnealingAcceptor,
};
pub use manager::{
    InMemoryStore, JobRegistry, JobResult, JobState, JobStatus, ProblemSource, ResultSink,
    ShiftSolverManager,
};
pub use scope::SearchScope;
pub use solver::{ShiftSolver, SolveOutput};
pub use termination::{
    BestScoreTermination, ExternalTermination, MoveCountTermination, OrTermination, Termination,
    TimeTermination, UnimprovedMoveCountTermination, UnimprovedTimeTermination,
};
pub use units::build_units;
