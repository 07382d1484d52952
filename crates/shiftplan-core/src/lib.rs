//! shiftplan core - shared types of the staff rostering optimizer
//!
//! This crate provides:
//! - The two-level [`HardSoftScore`]
//! - The immutable domain model of one solve
//! - Assignable units and the working [`Schedule`]
//! - The error type shared by all shiftplan crates

pub mod domain;
pub mod error;
pub mod score;

pub use domain::{
    AssignableUnit, DomainModel, EmployeeId, JobId, ProblemKey, ProblemSnapshot, Schedule, Stage,
    TimeWindow, UnitId, UnitShape,
};
pub use error::{Result, ShiftPlanError};
pub use score::{HardSoftScore, ScoreLevel, ScoreParseError};
