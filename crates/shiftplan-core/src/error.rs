//! Error types for shiftplan

use thiserror::Error;

use crate::domain::{EmployeeId, JobId, ProblemKey, UnitId};

/// Main error type for shiftplan operations
#[derive(Debug, Error)]
pub enum ShiftPlanError {
    /// Input rejected before a job was created
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error in the loaded domain model
    #[error("Domain model error: {0}")]
    DomainModel(String),

    /// Invalid operation for the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A pinned unit was the target of a change
    #[error("Unit {0} is pinned")]
    PinnedUnit(UnitId),

    /// The proposed employee is not in the unit's candidate set
    #[error("Employee {employee} is not a candidate of unit {unit}")]
    NotACandidate { unit: UnitId, employee: EmployeeId },

    /// Result materialization failed; prior committed rows are intact
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Another job is active for the same problem identity
    #[error("A job is already active for {0}")]
    JobConflict(ProblemKey),

    #[error("Job {0} not found")]
    JobNotFound(JobId),

    #[error("Job {job} has not completed (state {state})")]
    JobNotCompleted { job: JobId, state: String },

    /// Unexpected failure inside a solve
    #[error("Solver error: {0}")]
    Solver(String),
}

/// Result type alias for shiftplan operations
pub type Result<T> = std::result::Result<T, ShiftPlanError>;
