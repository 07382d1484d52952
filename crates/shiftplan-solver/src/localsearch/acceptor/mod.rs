//! Acceptors for local search move acceptance.
//!
//! An acceptor compares the score after a move with the score of the last
//! accepted step and decides whether the move stays.

mod hill_climbing;
mod late_acceptance;
mod simulated_annealing;

use std::fmt::Debug;

use shiftplan_config::AcceptorConfig;
use shiftplan_core::HardSoftScore;

pub use hill_climbing::HillClimbingAcceptor;
pub use late_acceptance::LateAcceptanceAcceptor;
pub use simulated_annealing::SimulatedAnnealingAcceptor;

/// Accepts or rejects moves in local search.
pub trait Acceptor: Send + Debug {
    /// Returns true if a move resulting in `move_score` should be kept,
    /// given the score of the last accepted step.
    fn is_accepted(&mut self, last_step_score: &HardSoftScore, move_score: &HardSoftScore) -> bool;

    /// Called once before the first move.
    fn phase_started(&mut self, _initial_score: &HardSoftScore) {}

    /// Called after each accepted move.
    fn step_ended(&mut self, _step_score: &HardSoftScore) {}
}

impl<A: Acceptor + ?Sized> Acceptor for Box<A> {
    fn is_accepted(&mut self, last_step_score: &HardSoftScore, move_score: &HardSoftScore) -> bool {
        (**self).is_accepted(last_step_score, move_score)
    }

    fn phase_started(&mut self, initial_score: &HardSoftScore) {
        (**self).phase_started(initial_score)
    }

    fn step_ended(&mut self, step_score: &HardSoftScore) {
        (**self).step_ended(step_score)
    }
}

/// Builds the configured acceptor. `seed` feeds acceptors that draw
/// random numbers.
pub fn build_acceptor(config: &AcceptorConfig, seed: u64) -> Box<dyn Acceptor> {
    match config {
        AcceptorConfig::HillClimbing => Box::new(HillClimbingAcceptor),
        AcceptorConfig::LateAcceptance(c) => {
            Box::new(LateAcceptanceAcceptor::new(c.late_acceptance_size))
        }
        AcceptorConfig::SimulatedAnnealing(c) => Box::new(SimulatedAnnealingAcceptor::new(
            c.starting_temperature,
            c.decay_rate,
            seed,
        )),
    }
}
