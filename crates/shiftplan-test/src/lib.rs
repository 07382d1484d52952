//! Shared test fixtures for shiftplan crates.
//!
//! This crate provides builders and helpers for tests only.
//! It does NOT depend on `shiftplan-scoring` or `shiftplan-solver` so both
//! can use it as a dev-dependency.
//!
//! - [`calendar`] - terse constructors for dates, times and windows
//! - [`snapshot`] - [`SnapshotBuilder`] for problem snapshots
//! - [`units`] - hand-made assignable units
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! shiftplan-test = { workspace = true }
//! ```
//!
//! ```
//! use shiftplan_core::Stage;
//! use shiftplan_test::{date, window, SnapshotBuilder};
//!
//! let model = SnapshotBuilder::new("S1", date(2025, 1, 1), Stage::Attendance)
//!     .employee("E1")
//!     .pattern("E1", "EARLY", window(9, 0, 13, 0), 3)
//!     .model();
//! assert_eq!(model.employees().len(), 1);
//! ```

pub mod calendar;
pub mod snapshot;
pub mod units;

pub use calendar::{date, time, window};
pub use snapshot::{daily_cap, SnapshotBuilder};
pub use units::{assignment_unit, attendance_unit};
