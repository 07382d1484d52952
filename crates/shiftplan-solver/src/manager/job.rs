//! Job lifecycle types.

use std::fmt;

use shiftplan_core::domain::{AssignmentRow, AttendanceRow};
use shiftplan_core::{HardSoftScore, JobId, ProblemKey, Schedule};
use shiftplan_scoring::ScoreAnalysis;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "QUEUED",
            JobState::Running => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
        }
    }

    /// True for states a job never leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable status of a job.
///
/// `hard` and `soft` carry the best score known so far, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct JobStatus {
    pub state: JobState,
    pub hard: Option<i64>,
    pub soft: Option<i64>,
    pub cause: Option<String>,
}

impl JobStatus {
    pub fn queued() -> Self {
        Self {
            state: JobState::Queued,
            hard: None,
            soft: None,
            cause: None,
        }
    }

    pub(crate) fn with_state(&self, state: JobState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }

    pub(crate) fn with_score(&self, score: HardSoftScore) -> Self {
        Self {
            hard: Some(score.hard()),
            soft: Some(score.soft()),
            ..self.clone()
        }
    }

    pub(crate) fn failed(&self, cause: impl Into<String>) -> Self {
        Self {
            state: JobState::Failed,
            cause: Some(cause.into()),
            ..self.clone()
        }
    }

    /// Score of the status, when one is known.
    pub fn score(&self) -> Option<HardSoftScore> {
        Some(HardSoftScore::of(self.hard?, self.soft?))
    }
}

/// Output of a completed job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job: JobId,
    pub key: ProblemKey,
    pub score: HardSoftScore,
    pub schedule: Schedule,
    pub analysis: ScoreAnalysis,
    /// Rows written for an attendance job, empty otherwise.
    pub attendance: Vec<AttendanceRow>,
    /// Rows written for an assignment job, empty otherwise.
    pub assignments: Vec<AssignmentRow>,
    /// True when the job ended through cancellation.
    pub cancelled: bool,
}
