//! One blocking solve without the job machinery.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use shiftplan_config::SolverConfig;
use shiftplan_core::{DomainModel, ProblemSnapshot, Result, ShiftPlanError};
use shiftplan_solver::{ShiftSolver, SolveOutput};
use tracing::debug;

/// Configuration picked up by [`run_solver`] from the working directory.
pub const SOLVER_CONFIG_FILE: &str = "solver.toml";

/// Solves `snapshot` on the calling thread.
///
/// Reads [`SOLVER_CONFIG_FILE`] when it exists, otherwise uses defaults.
/// Nothing is persisted.
pub fn run_solver(snapshot: ProblemSnapshot) -> Result<SolveOutput> {
    let config = if Path::new(SOLVER_CONFIG_FILE).exists() {
        SolverConfig::load(SOLVER_CONFIG_FILE)
            .map_err(|e| ShiftPlanError::Validation(e.to_string()))?
    } else {
        debug!(event = "default_config", file = SOLVER_CONFIG_FILE);
        SolverConfig::default()
    };
    config
        .validate()
        .map_err(|e| ShiftPlanError::Validation(e.to_string()))?;

    let model = Arc::new(DomainModel::build(snapshot)?);
    ShiftSolver::new(config).solve(model, Arc::new(AtomicBool::new(false)))
}
