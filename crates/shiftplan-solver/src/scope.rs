//! Progress state of one local search run.

use std::time::{Duration, Instant};

use shiftplan_core::HardSoftScore;

/// Counters and best score a search exposes to terminations.
#[derive(Debug, Clone)]
pub struct SearchScope {
    started: Instant,
    moves: u64,
    accepted: u64,
    best_score: HardSoftScore,
    last_improvement_move: u64,
    last_improvement_at: Instant,
}

impl SearchScope {
    pub fn new(initial_score: HardSoftScore) -> Self {
        let now = Instant::now();
        Self {
            started: now,
            moves: 0,
            accepted: 0,
            best_score: initial_score,
            last_improvement_move: 0,
            last_improvement_at: now,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Moves evaluated so far.
    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn best_score(&self) -> HardSoftScore {
        self.best_score
    }

    pub fn moves_since_improvement(&self) -> u64 {
        self.moves - self.last_improvement_move
    }

    pub fn time_since_improvement(&self) -> Duration {
        self.last_improvement_at.elapsed()
    }

    pub(crate) fn move_evaluated(&mut self, accepted: bool) {
        self.moves += 1;
        if accepted {
            self.accepted += 1;
        }
    }

    /// Records `score` as the new best when it beats the current one.
    pub(crate) fn offer_best(&mut self, score: HardSoftScore) -> bool {
        if score <= self.best_score {
            return false;
        }
        self.best_score = score;
        self.last_improvement_move = self.moves;
        self.last_improvement_at = Instant::now();
        true
    }

    #[cfg(test)]
    pub(crate) fn with_moves(mut self, moves: u64) -> Self {
        self.moves = moves;
        self
    }
}
