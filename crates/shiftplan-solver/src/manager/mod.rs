//! Job orchestration.
//!
//! - [`JobRegistry`] - at most one active job per [`ProblemKey`](shiftplan_core::ProblemKey)
//! - [`ProblemSource`] / [`ResultSink`] - persistence collaborators
//! - [`InMemoryStore`] - both collaborators over in-process maps
//! - [`ShiftSolverManager`] - submit, observe, cancel and collect jobs

mod job;
mod persistence;
mod registry;
mod solver_manager;

#[cfg(test)]
mod tests;

pub use job::{JobResult, JobState, JobStatus};
pub use persistence::{InMemoryStore, ProblemSource, ResultSink};
pub use registry::JobRegistry;
pub use solver_manager::ShiftSolverManager;
