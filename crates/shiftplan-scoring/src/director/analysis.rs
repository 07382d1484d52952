//! Per-rule score breakdowns.

use shiftplan_core::{HardSoftScore, ScoreLevel};

/// Contribution of a single rule to the score.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ConstraintAnalysis {
    /// Rule name.
    pub name: String,
    pub level: ScoreLevel,
    /// Score contribution from this rule.
    pub score: HardSoftScore,
    /// Number of penalized terms.
    pub match_count: usize,
}

/// Result of analyzing a schedule's rules.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScoreAnalysis {
    /// The total score.
    pub score: HardSoftScore,
    /// One entry per rule, in rule order.
    pub constraints: Vec<ConstraintAnalysis>,
}

impl ScoreAnalysis {
    pub fn constraint(&self, name: &str) -> Option<&ConstraintAnalysis> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Rules with at least one penalized term.
    pub fn violated(&self) -> impl Iterator<Item = &ConstraintAnalysis> {
        self.constraints.iter().filter(|c| c.match_count > 0)
    }
}
