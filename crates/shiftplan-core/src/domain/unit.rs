//! Assignable units: the only mutable part of a working schedule.

use std::fmt;

use chrono::NaiveDate;

use super::{EmployeeId, Resource, TimeWindow};

/// Position of a unit within its [`Schedule`](super::Schedule).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId(pub usize);

impl UnitId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U{}", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U{}", self.0)
    }
}

/// What a unit stands for, one shape per stage.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitShape {
    /// One seat of headcount in a pattern window.
    Attendance {
        department_code: Option<String>,
        date: NaiveDate,
        window: TimeWindow,
        replica: u32,
    },
    /// One slot on a register or task.
    Assignment {
        date: NaiveDate,
        window: TimeWindow,
        resource: Resource,
        lane: u32,
    },
}

/// A decision point that takes one employee or none.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignableUnit {
    pub id: UnitId,
    pub shape: UnitShape,
    /// Sorted employees allowed to fill the unit.
    pub candidates: Vec<EmployeeId>,
    pub assigned: Option<EmployeeId>,
    /// Excluded from search moves for the whole job.
    pub pinned: bool,
    /// Leaving the unit empty is a hard violation.
    pub mandatory: bool,
}

impl AssignableUnit {
    pub fn new(id: UnitId, shape: UnitShape) -> Self {
        Self {
            id,
            shape,
            candidates: Vec::new(),
            assigned: None,
            pinned: false,
            mandatory: false,
        }
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn date(&self) -> NaiveDate {
        match &self.shape {
            UnitShape::Attendance { date, .. } | UnitShape::Assignment { date, .. } => *date,
        }
    }

    pub fn window(&self) -> TimeWindow {
        match &self.shape {
            UnitShape::Attendance { window, .. } | UnitShape::Assignment { window, .. } => {
                *window
            }
        }
    }

    pub fn minutes(&self) -> i64 {
        self.window().minutes()
    }

    pub fn resource(&self) -> Option<&Resource> {
        match &self.shape {
            UnitShape::Assignment { resource, .. } => Some(resource),
            UnitShape::Attendance { .. } => None,
        }
    }

    /// Replica index for attendance units, lane for assignment units.
    pub fn lane(&self) -> u32 {
        match &self.shape {
            UnitShape::Attendance { replica, .. } => *replica,
            UnitShape::Assignment { lane, .. } => *lane,
        }
    }

    pub fn department_code(&self) -> Option<&str> {
        match &self.shape {
            UnitShape::Attendance {
                department_code, ..
            } => department_code.as_deref(),
            UnitShape::Assignment { .. } => None,
        }
    }

    /// True when `value` may be held: none, or a listed candidate.
    pub fn accepts(&self, value: Option<EmployeeId>) -> bool {
        value.map_or(true, |e| self.candidates.binary_search(&e).is_ok())
    }
}
