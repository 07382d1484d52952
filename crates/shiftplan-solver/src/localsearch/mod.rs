//! Local search over a constructed schedule.
//!
//! - [`ScheduleMove`] - change or swap of unit holders
//! - [`MoveSelector`] - random doable moves over the unpinned units
//! - [`Acceptor`] - hill climbing, late acceptance, simulated annealing
//! - [`LocalSearch`] - the move loop, keeping the best snapshot

mod acceptor;
mod moves;
mod phase;

#[cfg(test)]
mod tests;

pub use acceptor::{
    build_acceptor, Acceptor, HillClimbingAcceptor, LateAcceptanceAcceptor,
    SimulatedAnnealingAcceptor,
};
pub use moves::{MoveSelector, MoveUndo, ScheduleMove};
pub use phase::{BestSolutionEvent, LocalSearch, SearchOutcome};
