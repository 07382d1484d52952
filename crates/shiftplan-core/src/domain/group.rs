//! Attendance-group rules over fixed member sets.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum GroupRule {
    /// At least `min` members on duty each date.
    MinOnDuty { min: u32 },
    /// Members must not all work the same date.
    NoSameDayWork,
    /// Either every member works a date or none does.
    AllOrNothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttendanceGroup {
    pub id: String,
    pub store_code: String,
    pub department_code: Option<String>,
    pub rule: GroupRule,
    pub members: BTreeSet<String>,
}

impl AttendanceGroup {
    /// Penalty for `on_duty` members being at work on one date.
    pub fn violation(&self, on_duty: usize) -> i64 {
        let total = self.members.len();
        match self.rule {
            GroupRule::MinOnDuty { min } => (min as i64 - on_duty as i64).max(0),
            GroupRule::NoSameDayWork => i64::from(total > 0 && on_duty == total),
            GroupRule::AllOrNothing => {
                if on_duty > 0 && on_duty < total {
                    on_duty.min(total - on_duty) as i64
                } else {
                    0
                }
            }
        }
    }
}
