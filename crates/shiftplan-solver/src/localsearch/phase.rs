//! The local search move loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use shiftplan_config::{MoveConfig, SolverConfig};
use shiftplan_core::{HardSoftScore, Result, Schedule};
use shiftplan_scoring::IncrementalDirector;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use super::acceptor::{build_acceptor, Acceptor};
use super::moves::MoveSelector;
use crate::scope::SearchScope;
use crate::termination::{self, Termination};

/// A new best schedule, announced while the search runs.
#[derive(Debug, Clone)]
pub struct BestSolutionEvent {
    pub schedule: Schedule,
    pub score: HardSoftScore,
    /// Moves evaluated when it was found.
    pub moves: u64,
}

/// What a search run produced.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best schedule seen, carrying its score.
    pub best: Schedule,
    pub score: HardSoftScore,
    /// Moves evaluated.
    pub moves: u64,
    /// Moves kept by the acceptor.
    pub accepted: u64,
    pub duration: Duration,
    /// True when the cancel flag ended the search.
    pub cancelled: bool,
}

/// Local search phase: draws moves, scores them through change
/// transactions and lets the acceptor decide.
///
/// Rejected moves are undone through the same transactions. The working
/// schedule is left wherever the walk ended; the best one is returned in
/// [`SearchOutcome::best`].
#[derive(Debug)]
pub struct LocalSearch {
    moves: MoveConfig,
    acceptor: Box<dyn Acceptor>,
    termination: Box<dyn Termination>,
    cancel: Arc<AtomicBool>,
    sender: Option<mpsc::UnboundedSender<BestSolutionEvent>>,
}

impl LocalSearch {
    pub fn new(
        moves: MoveConfig,
        acceptor: Box<dyn Acceptor>,
        termination: Box<dyn Termination>,
    ) -> Self {
        Self {
            moves,
            acceptor,
            termination,
            cancel: Arc::new(AtomicBool::new(false)),
            sender: None,
        }
    }

    /// Builds acceptor and terminations from `config`. The cancel flag is
    /// one of the terminations.
    pub fn from_config(
        config: &SolverConfig,
        cancel: Arc<AtomicBool>,
        acceptor_seed: u64,
    ) -> Result<Self> {
        let termination = termination::from_config(&config.termination, Arc::clone(&cancel))?;
        Ok(Self {
            moves: config.moves.clone(),
            acceptor: build_acceptor(&config.acceptor, acceptor_seed),
            termination: Box::new(termination),
            cancel,
            sender: None,
        })
    }

    /// Announces every new best schedule on `sender`.
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<BestSolutionEvent>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Flag reported as [`SearchOutcome::cancelled`] when set.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    fn announce(&self, director: &IncrementalDirector, score: HardSoftScore, moves: u64) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(BestSolutionEvent {
                schedule: director.snapshot(),
                score,
                moves,
            });
        }
    }

    /// Runs until a termination fires or no doable move can be drawn.
    pub fn run<R: Rng>(
        &mut self,
        director: &mut IncrementalDirector,
        rng: &mut R,
    ) -> Result<SearchOutcome> {
        let started = Instant::now();
        let selector = MoveSelector::new(director, self.moves.clone());
        let initial_score = director.score();
        let mut scope = SearchScope::new(initial_score);
        let mut best = director.snapshot();

        info!(
            event = "phase_start",
            phase = "local_search",
            units = director.units().len(),
            movable = selector.movable().len(),
            score = %initial_score,
        );
        self.acceptor.phase_started(&initial_score);
        self.announce(director, initial_score, 0);

        let mut last_progress_time = Instant::now();
        let mut last_progress_moves = 0u64;

        while !self.termination.is_terminated(&scope) {
            let Some(mv) = selector.next_move(director, rng) else {
                debug!(event = "no_doable_move", moves = scope.moves());
                break;
            };

            let last_score = director.score();
            let undo = mv.do_move(director)?;
            let move_score = director.score();
            let accepted = self.acceptor.is_accepted(&last_score, &move_score);
            scope.move_evaluated(accepted);

            trace!(
                event = "step",
                moves = scope.moves(),
                mv = %mv,
                score = %move_score,
                accepted,
            );

            if accepted {
                self.acceptor.step_ended(&move_score);
                if scope.offer_best(move_score) {
                    best = director.snapshot();
                    debug!(
                        event = "new_best",
                        moves = scope.moves(),
                        score = %move_score,
                    );
                    self.announce(director, move_score, scope.moves());
                }
            } else {
                undo.revert(director)?;
            }

            let now = Instant::now();
            if now.duration_since(last_progress_time).as_secs() >= 1 {
                let moves_delta = scope.moves() - last_progress_moves;
                let elapsed_secs = now.duration_since(last_progress_time).as_secs_f64();
                debug!(
                    event = "progress",
                    moves = scope.moves(),
                    speed = (moves_delta as f64 / elapsed_secs) as u64,
                    score = %director.score(),
                    best_score = %scope.best_score(),
                );
                last_progress_time = now;
                last_progress_moves = scope.moves();
            }
        }

        let outcome = SearchOutcome {
            score: scope.best_score(),
            best,
            moves: scope.moves(),
            accepted: scope.accepted(),
            duration: started.elapsed(),
            cancelled: self.cancel.load(Ordering::Relaxed),
        };
        info!(
            event = "phase_end",
            phase = "local_search",
            duration_ms = outcome.duration.as_millis() as u64,
            moves = outcome.moves,
            accepted = outcome.accepted,
            cancelled = outcome.cancelled,
            score = %outcome.score,
        );
        Ok(outcome)
    }
}
