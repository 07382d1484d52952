//! Late acceptance acceptor.

use shiftplan_core::HardSoftScore;

use super::Acceptor;

/// Accepts a move that improves on the last step or matches the score
/// accepted `late_acceptance_size` steps ago.
///
/// # Example
///
/// ```
/// use shiftplan_core::HardSoftScore;
/// use shiftplan_solver::{Acceptor, LateAcceptanceAcceptor};
///
/// let mut acceptor = LateAcceptanceAcceptor::new(2);
/// acceptor.phase_started(&HardSoftScore::of_soft(-10));
/// assert!(acceptor.is_accepted(&HardSoftScore::of_soft(-5), &HardSoftScore::of_soft(-8)));
/// assert!(!acceptor.is_accepted(&HardSoftScore::of_soft(-5), &HardSoftScore::of_soft(-11)));
/// ```
#[derive(Debug, Clone)]
pub struct LateAcceptanceAcceptor {
    late_acceptance_size: usize,
    score_history: Vec<HardSoftScore>,
    current_index: usize,
}

impl LateAcceptanceAcceptor {
    /// A size of zero is treated as one.
    pub fn new(late_acceptance_size: usize) -> Self {
        let size = late_acceptance_size.max(1);
        Self {
            late_acceptance_size: size,
            score_history: vec![HardSoftScore::ZERO; size],
            current_index: 0,
        }
    }
}

impl Default for LateAcceptanceAcceptor {
    fn default() -> Self {
        Self::new(400)
    }
}

impl Acceptor for LateAcceptanceAcceptor {
    fn is_accepted(&mut self, last_step_score: &HardSoftScore, move_score: &HardSoftScore) -> bool {
        if move_score > last_step_score {
            return true;
        }
        *move_score >= self.score_history[self.current_index]
    }

    fn phase_started(&mut self, initial_score: &HardSoftScore) {
        self.score_history.fill(*initial_score);
        self.current_index = 0;
    }

    fn step_ended(&mut self, step_score: &HardSoftScore) {
        self.score_history[self.current_index] = *step_score;
        self.current_index = (self.current_index + 1) % self.late_acceptance_size;
    }
}
