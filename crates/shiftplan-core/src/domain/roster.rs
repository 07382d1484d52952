//! Committed attendance and result rows.

use chrono::NaiveDate;

use super::{Resource, TimeWindow};

/// One committed attendance window, as read from or written to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RosterEntry {
    pub employee_code: String,
    pub date: NaiveDate,
    pub window: TimeWindow,
}

/// ATTENDANCE output row.
pub type AttendanceRow = RosterEntry;

/// ASSIGNMENT output row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignmentRow {
    pub employee_code: String,
    pub resource: Resource,
    pub date: NaiveDate,
    pub window: TimeWindow,
}
