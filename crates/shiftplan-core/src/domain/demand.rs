//! Demand slots and the resources they are staffed on.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};

/// Something an assignment unit is staffed on.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Resource {
    /// A cash register, by number.
    Register(u32),
    /// A department task, by code.
    Task(String),
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Register(no) => write!(f, "register:{}", no),
            Resource::Task(code) => write!(f, "task:{}", code),
        }
    }
}

/// Required headcount at one time point.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DemandSlot {
    pub store_code: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub department_code: Option<String>,
    pub resource: Option<Resource>,
    pub required: u32,
}

/// Register metadata used to order greedy assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterInfo {
    pub number: u32,
    pub auto_open_target: bool,
    pub open_priority: Option<u32>,
    /// Longest stretch one employee should hold the register.
    pub max_allowance_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskInfo {
    pub code: String,
    pub max_allowance_minutes: Option<i64>,
}
