//! Terminations counted in evaluated moves.

use super::Termination;
use crate::scope::SearchScope;

/// Stops after `limit` evaluated moves, accepted or not.
#[derive(Debug, Clone, Copy)]
pub struct MoveCountTermination {
    limit: u64,
}

impl MoveCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for MoveCountTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.moves() >= self.limit
    }
}

/// Stops after `limit` moves without a new best score.
#[derive(Debug, Clone, Copy)]
pub struct UnimprovedMoveCountTermination {
    limit: u64,
}

impl UnimprovedMoveCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for UnimprovedMoveCountTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.moves_since_improvement() >= self.limit
    }
}
