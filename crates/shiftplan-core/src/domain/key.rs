//! Problem identity and job handles.

use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Stage {
    /// Who works which window.
    Attendance,
    /// What each attendee does within their window.
    Assignment,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Attendance => "ATTENDANCE",
            Stage::Assignment => "ASSIGNMENT",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one solvable instance.
///
/// At most one job may be active per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemKey {
    pub store_code: String,
    pub cycle_start: NaiveDate,
    pub department_code: Option<String>,
    pub stage: Stage,
}

impl ProblemKey {
    pub fn new(
        store_code: impl Into<String>,
        cycle_start: NaiveDate,
        department_code: Option<String>,
        stage: Stage,
    ) -> Self {
        Self {
            store_code: store_code.into(),
            cycle_start,
            department_code,
            stage,
        }
    }

    /// The same store, cycle and department at another stage.
    pub fn with_stage(&self, stage: Stage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }
}

impl fmt::Display for ProblemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.store_code,
            self.cycle_start,
            self.department_code.as_deref().unwrap_or("-"),
            self.stage
        )
    }
}

/// Handle returned by job submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}
