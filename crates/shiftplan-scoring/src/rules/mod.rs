//! Penalty rules.
//!
//! Each rule contributes to exactly one score level and is evaluated one
//! [`TermKey`] at a time. Rules are plain values; [`RuleSet::for_stage`]
//! picks the rules that apply to a stage and wires their weights from
//! configuration.

use std::fmt::Debug;

use shiftplan_config::SolverConfig;
use shiftplan_core::{AssignableUnit, EmployeeId, ScoreLevel, Stage};

use crate::term::TermKey;
use crate::view::ScoreView;

mod hard;
mod soft;

#[cfg(test)]
mod tests;

pub use hard::{
    AttendanceGroupRule, ConsecutiveDays, DailyMinutesCap, EmployeeOverlap, MonthlyMinutesCap,
    MonthlyOffDays, PatternMismatch, RequestedDayOff, ResourceDoubleBooking, SkillDisqualified,
    UnassignedMandatory, WeeklyMinutesCap, WeeklyOffOrOutsideBase,
};
pub use soft::{
    DailyWorkers, Fragmentation, HandoffChurn, HeadcountBalance, MinutesShortfall, MissingBreak,
    MonthlyWorkDays, PatternPriority, WorkloadBalance,
};

/// One constraint of the roster.
pub trait PenaltyRule: Send + Sync + Debug {
    /// Stable snake_case name used in analysis and logs.
    fn name(&self) -> &'static str;

    fn level(&self) -> ScoreLevel;

    /// Pushes the terms `unit` feeds.
    ///
    /// Called with `None` for terms that exist whoever holds the unit, and
    /// with `Some(employee)` for terms of that employee which the unit joins
    /// while held by them.
    fn unit_terms(
        &self,
        view: &ScoreView<'_>,
        unit: &AssignableUnit,
        employee: Option<EmployeeId>,
        out: &mut Vec<TermKey>,
    );

    /// Terms that can be penalized with no unit assigned at all.
    fn global_terms(&self, _view: &ScoreView<'_>, _out: &mut Vec<TermKey>) {}

    /// Penalty magnitude of one term, zero or positive.
    fn evaluate(&self, key: &TermKey, view: &ScoreView<'_>) -> i64;
}

/// Ordered collection of rules for one stage.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn PenaltyRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: impl PenaltyRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Standard rules of a stage with weights from `config`.
    pub fn for_stage(stage: Stage, config: &SolverConfig) -> Self {
        let scoring = &config.scoring;
        let eligibility = &config.eligibility;
        let shared = Self::new()
            .with_rule(UnassignedMandatory)
            .with_rule(EmployeeOverlap)
            .with_rule(RequestedDayOff)
            .with_rule(WeeklyOffOrOutsideBase)
            .with_rule(PatternMismatch {
                min_priority: eligibility.min_pattern_priority,
            })
            .with_rule(SkillDisqualified {
                min_level: eligibility.min_skill_level,
            })
            .with_rule(DailyMinutesCap {
                default_cap: scoring.default_max_daily_minutes,
            })
            .with_rule(WeeklyMinutesCap)
            .with_rule(MonthlyMinutesCap)
            .with_rule(HeadcountBalance {
                balance_weight: scoring.balance_weight,
                overstaff_weight: scoring.overstaff_weight,
                uncovered_weight: scoring.uncovered_weight,
            })
            .with_rule(WorkloadBalance {
                weight: scoring.workload_weight,
            })
            .with_rule(Fragmentation {
                weight: scoring.fragmentation_weight,
                gap_minutes: scoring.fragmentation_gap_minutes,
            });

        match stage {
            Stage::Attendance => shared
                .with_rule(ConsecutiveDays {
                    cap: eligibility.max_consecutive_days,
                })
                .with_rule(MonthlyOffDays)
                .with_rule(AttendanceGroupRule)
                .with_rule(MonthlyWorkDays {
                    weight: scoring.work_day_weight,
                })
                .with_rule(PatternPriority {
                    weight: scoring.pattern_weight,
                    max_priority: scoring.max_priority,
                    min_priority: eligibility.min_pattern_priority,
                })
                .with_rule(MinutesShortfall {
                    weight: scoring.shortfall_weight,
                }),
            Stage::Assignment => shared
                .with_rule(ResourceDoubleBooking)
                .with_rule(MissingBreak {
                    weight: scoring.break_weight,
                    threshold_minutes: scoring.break_threshold_minutes,
                    break_minutes: scoring.break_minutes,
                })
                .with_rule(HandoffChurn {
                    weight: scoring.handoff_weight,
                })
                .with_rule(DailyWorkers {
                    weight: scoring.daily_workers_weight,
                }),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, idx: usize) -> &dyn PenaltyRule {
        self.rules[idx].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PenaltyRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|r| r.name()).collect()
    }
}
