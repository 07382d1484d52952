//! Employees and their work-time bounds.

use std::fmt;

/// Index of an employee within a [`DomainModel`](super::DomainModel).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmployeeId(pub usize);

impl EmployeeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Optional per-period caps and floors, in minutes or days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorkLimits {
    pub min_minutes_day: Option<i64>,
    pub max_minutes_day: Option<i64>,
    pub min_minutes_week: Option<i64>,
    pub max_minutes_week: Option<i64>,
    pub min_minutes_month: Option<i64>,
    pub max_minutes_month: Option<i64>,
    pub max_work_days_month: Option<u32>,
    pub min_off_days_month: Option<u32>,
    pub max_off_days_month: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Employee {
    pub code: String,
    pub store_code: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub limits: WorkLimits,
}

impl Employee {
    pub fn new(code: impl Into<String>, store_code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            store_code: store_code.into(),
            limits: WorkLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: WorkLimits) -> Self {
        self.limits = limits;
        self
    }
}
