//! Domain model: immutable inputs of one solve and the assignable units.
//!
//! - [`ProblemSnapshot`] - raw inputs as loaded from persistence
//! - [`DomainModel`] - validated, indexed, read-only view of a snapshot
//! - [`AssignableUnit`] - one decision point of a [`Schedule`]
//! - [`ProblemKey`] - identity of a solvable instance

mod availability;
mod demand;
mod employee;
mod group;
mod key;
mod model;
mod roster;
mod schedule;
mod skill;
mod snapshot;
mod unit;
pub mod window;


pub use availability::{EmployeePattern, EmployeeRequest, RequestKind, WeeklyPreference, WorkStyle};
pub use demand::{DemandSlot, RegisterInfo, Resource, TaskInfo};
pub use employee::{Employee, EmployeeId, WorkLimits};
pub use group::{AttendanceGroup, GroupRule};
pub use key::{JobId, ProblemKey, Stage};
pub use model::{DomainModel, PreferOn};
pub use roster::{AssignmentRow, AttendanceRow, RosterEntry};
pub use schedule::Schedule;
pub use skill::{RegisterSkill, SkillMap, TaskSkill, MIN_QUALIFYING_LEVEL};
pub use snapshot::{ProblemSnapshot, DEFAULT_SLOT_MINUTES};
pub use unit::{AssignableUnit, UnitId, UnitShape};
pub use window::TimeWindow;
