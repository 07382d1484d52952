//! Hill climbing acceptor.

use shiftplan_core::HardSoftScore;

use super::Acceptor;

/// Accepts moves that do not worsen the score.
///
/// Equal scores are accepted so the search can walk plateaus.
#[derive(Debug, Clone, Copy, Default)]
pub struct HillClimbingAcceptor;

impl Acceptor for HillClimbingAcceptor {
    fn is_accepted(&mut self, last_step_score: &HardSoftScore, move_score: &HardSoftScore) -> bool {
        move_score >= last_step_score
    }
}
