//! Two-level roster score.
//!
//! Penalties are negative: a score of `0hard/0soft` is perfect, any negative
//! hard part marks an infeasible roster.

mod hard_soft;


pub use hard_soft::{HardSoftScore, ScoreParseError};

/// Score level a penalty rule contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScoreLevel {
    /// Feasibility; must be zero for a usable roster
    Hard,
    /// Quality objectives
    Soft,
}
