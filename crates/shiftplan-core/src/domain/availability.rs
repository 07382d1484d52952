//! Shift patterns, weekly preferences and one-off requests.

use chrono::{NaiveDate, Weekday};

use super::TimeWindow;

/// A window an employee may be rostered for, with a usage priority.
///
/// Priority 0 marks the pattern unusable; only priorities of 2 and above
/// make the employee eligible for the window.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmployeePattern {
    pub employee_code: String,
    pub pattern_code: String,
    pub window: TimeWindow,
    pub priority: u8,
    pub active: bool,
}

impl EmployeePattern {
    pub fn new(
        employee_code: impl Into<String>,
        pattern_code: impl Into<String>,
        window: TimeWindow,
        priority: u8,
    ) -> Self {
        Self {
            employee_code: employee_code.into(),
            pattern_code: pattern_code.into(),
            window,
            priority,
            active: true,
        }
    }

    pub fn is_usable(&self, min_priority: u8) -> bool {
        self.active && self.priority >= min_priority
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum WorkStyle {
    Off,
    Optional,
    Mandatory,
}

/// Per-weekday availability of one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeeklyPreference {
    pub employee_code: String,
    pub weekday: Weekday,
    pub style: WorkStyle,
    /// Bounds any work on that weekday when present.
    pub base_window: Option<TimeWindow>,
}

impl WeeklyPreference {
    /// True when work in `window` on this weekday is allowed.
    pub fn permits(&self, window: &TimeWindow) -> bool {
        if self.style == WorkStyle::Off {
            return false;
        }
        self.base_window.map_or(true, |base| base.contains(window))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RequestKind {
    Off,
    PaidLeave,
    PreferOn,
}

impl RequestKind {
    /// True for kinds that forbid attendance on the date.
    pub fn blocks_attendance(self) -> bool {
        matches!(self, RequestKind::Off | RequestKind::PaidLeave)
    }
}

/// A date-scoped request of one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmployeeRequest {
    pub employee_code: String,
    pub date: NaiveDate,
    pub kind: RequestKind,
    /// Required for `PreferOn`.
    pub window: Option<TimeWindow>,
}
