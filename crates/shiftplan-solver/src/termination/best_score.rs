//! Best score termination.

use shiftplan_core::HardSoftScore;

use super::Termination;
use crate::scope::SearchScope;

/// Stops once the best score reaches `target`.
#[derive(Debug, Clone, Copy)]
pub struct BestScoreTermination {
    target: HardSoftScore,
}

impl BestScoreTermination {
    pub fn new(target: HardSoftScore) -> Self {
        Self { target }
    }
}

impl Termination for BestScoreTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.best_score() >= self.target
    }
}
