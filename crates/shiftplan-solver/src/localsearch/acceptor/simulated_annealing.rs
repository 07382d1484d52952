//! Simulated annealing acceptor.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shiftplan_core::HardSoftScore;

use super::Acceptor;

/// Metropolis acceptance over the scalar score.
///
/// A worsening move of `delta` is accepted with probability
/// `exp(delta / temperature)`. The temperature decays after every
/// accepted step. Hard levels weigh a million soft points each, so a hard
/// worsening is effectively never accepted.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealingAcceptor {
    starting_temperature: f64,
    current_temperature: f64,
    decay_rate: f64,
    rng: ChaCha8Rng,
}

impl SimulatedAnnealingAcceptor {
    pub fn new(starting_temperature: f64, decay_rate: f64, seed: u64) -> Self {
        Self {
            starting_temperature,
            current_temperature: starting_temperature,
            decay_rate,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn temperature(&self) -> f64 {
        self.current_temperature
    }
}

impl Acceptor for SimulatedAnnealingAcceptor {
    fn is_accepted(&mut self, last_step_score: &HardSoftScore, move_score: &HardSoftScore) -> bool {
        if move_score >= last_step_score {
            return true;
        }
        if self.current_temperature <= f64::EPSILON {
            return false;
        }
        let delta = move_score.to_scalar() - last_step_score.to_scalar();
        let probability = (delta / self.current_temperature).exp();
        self.rng.random::<f64>() < probability
    }

    fn phase_started(&mut self, _initial_score: &HardSoftScore) {
        self.current_temperature = self.starting_temperature;
    }

    fn step_ended(&mut self, _step_score: &HardSoftScore) {
        self.current_temperature *= self.decay_rate;
    }
}
