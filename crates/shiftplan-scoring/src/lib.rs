//! Incremental roster scoring for shiftplan.
//!
//! This crate provides:
//! - Penalty rules, one per constraint, grouped by [`TermKey`]
//! - The [`IncrementalDirector`] owning the working [`Schedule`](shiftplan_core::Schedule)
//! - Change transactions ([`ChangeGuard`]) that rescore only affected terms
//! - Per-rule [`ScoreAnalysis`]
//!
//! # Architecture
//!
//! A rule never scores the whole schedule. It names the terms a unit feeds
//! and evaluates one term at a time against a read-only [`ScoreView`]. The
//! director indexes unit → terms once at load, so a change touches only the
//! terms of the unit itself and of the old and new employee.

pub mod director;
pub mod rules;
pub mod term;
pub mod view;

pub use director::{
    ChangeGuard, ConstraintAnalysis, IncrementalDirector, ScoreAnalysis,
};
pub use rules::{PenaltyRule, RuleSet};
pub use term::TermKey;
pub use view::{LiveIndex, ScoreView, StaticIndex};
