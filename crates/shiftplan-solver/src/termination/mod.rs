//! Termination conditions for local search.
//!
//! Terminations are checked between moves, never during one.

mod best_score;
mod composite;
mod external;
mod move_count;
mod time;

use std::fmt::Debug;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use shiftplan_config::TerminationConfig;
use shiftplan_core::{Result, ShiftPlanError};

use crate::scope::SearchScope;

pub use best_score::BestScoreTermination;
pub use composite::OrTermination;
pub use external::ExternalTermination;
pub use move_count::{MoveCountTermination, UnimprovedMoveCountTermination};
pub use time::{TimeTermination, UnimprovedTimeTermination};

/// Decides when a search stops.
pub trait Termination: Send + Debug {
    /// Returns true if the search should stop before the next move.
    fn is_terminated(&self, scope: &SearchScope) -> bool;
}

impl<T: Termination + ?Sized> Termination for Box<T> {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        (**self).is_terminated(scope)
    }
}

/// Composes every configured limit with the cancel flag.
///
/// # Errors
///
/// `Validation` when `best_score_limit` does not parse.
pub fn from_config(config: &TerminationConfig, cancel: Arc<AtomicBool>) -> Result<OrTermination> {
    let mut any = OrTermination::new().with(ExternalTermination::new(cancel));
    if let Some(limit) = config.time_limit() {
        any = any.with(TimeTermination::new(limit));
    }
    if let Some(moves) = config.move_count_limit {
        any = any.with(MoveCountTermination::new(moves));
    }
    if let Some(moves) = config.unimproved_move_count_limit {
        any = any.with(UnimprovedMoveCountTermination::new(moves));
    }
    if let Some(limit) = config.unimproved_time_limit() {
        any = any.with(UnimprovedTimeTermination::new(limit));
    }
    let best = config
        .best_score()
        .map_err(|e| ShiftPlanError::Validation(e.to_string()))?;
    if let Some(target) = best {
        any = any.with(BestScoreTermination::new(target));
    }
    Ok(any)
}
