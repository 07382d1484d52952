//! Tests for individual penalty rules.

use std::sync::Arc;

use chrono::Weekday;
use shiftplan_config::SolverConfig;
use shiftplan_core::domain::{GroupRule, RegisterInfo, Resource, WorkLimits, WorkStyle};
use shiftplan_core::{AssignableUnit, DomainModel, EmployeeId, HardSoftScore, Schedule, Stage};
use shiftplan_test::{assignment_unit, attendance_unit, daily_cap, date, time, window, SnapshotBuilder};

use super::*;
use crate::director::IncrementalDirector;

fn attendance() -> SnapshotBuilder {
    SnapshotBuilder::new("S1", date(2025, 1, 1), Stage::Attendance)
}

fn assignment() -> SnapshotBuilder {
    SnapshotBuilder::new("S1", date(2025, 1, 1), Stage::Assignment)
}

fn held(mut unit: AssignableUnit, employee: usize) -> AssignableUnit {
    unit.assigned = Some(EmployeeId(employee));
    unit
}

fn score_with(
    model: DomainModel,
    stage: Stage,
    units: Vec<AssignableUnit>,
    rule: impl PenaltyRule + 'static,
) -> HardSoftScore {
    let director = IncrementalDirector::new(
        Arc::new(model),
        Schedule::new(stage, units),
        RuleSet::new().with_rule(rule),
    );
    let score = director.score();
    assert_eq!(score, director.calculate_full());
    score
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_overlap_counts_one_pair() {
    let model = attendance().employee("E1").model();
    let d = date(2025, 1, 10);
    let units = vec![
        held(attendance_unit(0, d, window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(1, d, window(12, 0, 16, 0), &[0]), 0),
    ];

    let score = score_with(model, Stage::Attendance, units, EmployeeOverlap);
    assert_eq!(score, HardSoftScore::of_hard(-1));
}

#[test]
fn test_overlap_within_full_rule_set() {
    let model = attendance().employee("E1").model();
    let d = date(2025, 1, 10);
    let units = vec![
        held(attendance_unit(0, d, window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(1, d, window(12, 0, 16, 0), &[0]), 0),
        held(attendance_unit(2, d, window(16, 0, 18, 0), &[0]), 0),
    ];
    let director = IncrementalDirector::new(
        Arc::new(model),
        Schedule::new(Stage::Attendance, units),
        RuleSet::for_stage(Stage::Attendance, &SolverConfig::default()),
    );

    let analysis = director.analyze();
    let overlap = analysis.constraint("employee_overlap").unwrap();
    assert_eq!(overlap.score, HardSoftScore::of_hard(-1));
    assert_eq!(overlap.match_count, 1);
}

#[test]
fn test_uncovered_slot_penalized_more_than_partial_cover() {
    let d = date(2025, 1, 10);
    let model = Arc::new(
        assignment()
            .employee("E1")
            .employee("E2")
            .employee("E3")
            .demand(d, time(10, 0), Some(Resource::Register(5)), 3)
            .model(),
    );
    let units: Vec<_> = (0..3)
        .map(|lane| {
            assignment_unit(
                lane as usize,
                d,
                window(10, 0, 10, 15),
                Resource::Register(5),
                lane,
                &[0, 1, 2],
            )
        })
        .collect();
    let rule = HeadcountBalance {
        balance_weight: 200,
        overstaff_weight: 10,
        uncovered_weight: 120,
    };
    let mut director = IncrementalDirector::new(
        model,
        Schedule::new(Stage::Assignment, units),
        RuleSet::new().with_rule(rule),
    );

    let empty = director.score();
    assert_eq!(empty, HardSoftScore::of_soft(-(3 * 2 * 200 + 120 * 2 * 3)));

    director
        .begin_change(shiftplan_core::UnitId(0))
        .commit(Some(EmployeeId(0)))
        .unwrap();
    let partial = director
        .begin_change(shiftplan_core::UnitId(1))
        .commit(Some(EmployeeId(1)))
        .unwrap();
    assert_eq!(partial, HardSoftScore::of_soft(-400));
    assert!(partial > empty);
}

#[test]
fn test_daily_cap_counts_minutes_over() {
    let model = attendance().employee_with_limits("E1", daily_cap(480)).model();
    let d = date(2025, 1, 10);
    let units = vec![
        held(attendance_unit(0, d, window(8, 0, 16, 0), &[0]), 0),
        held(attendance_unit(1, d, window(16, 0, 16, 20), &[0]), 0),
    ];

    let score = score_with(model, Stage::Attendance, units, DailyMinutesCap { default_cap: 480 });
    assert_eq!(score, HardSoftScore::of_hard(-20));
}

#[test]
fn test_daily_cap_falls_back_to_default() {
    let model = attendance().employee("E1").model();
    let d = date(2025, 1, 10);
    let units = vec![held(attendance_unit(0, d, window(8, 0, 17, 0), &[0]), 0)];

    let score = score_with(model, Stage::Attendance, units, DailyMinutesCap { default_cap: 480 });
    assert_eq!(score, HardSoftScore::of_hard(-60));
}

// ============================================================================
// Hard rules
// ============================================================================

#[test]
fn test_unassigned_mandatory() {
    let model = assignment().employee("E1").model();
    let d = date(2025, 1, 10);
    let units = vec![
        assignment_unit(0, d, window(10, 0, 10, 15), Resource::Register(1), 0, &[0]),
        held(
            assignment_unit(1, d, window(10, 15, 10, 30), Resource::Register(1), 0, &[0]),
            0,
        ),
        attendance_unit(2, d, window(9, 0, 13, 0), &[0]),
    ];

    let score = score_with(model, Stage::Assignment, units, UnassignedMandatory);
    assert_eq!(score, HardSoftScore::of_hard(-1));
}

#[test]
fn test_resource_double_booking_on_shared_lane() {
    let model = assignment().employee("E1").employee("E2").model();
    let d = date(2025, 1, 10);
    let units = vec![
        held(
            assignment_unit(0, d, window(10, 0, 10, 30), Resource::Register(1), 0, &[0, 1]),
            0,
        ),
        held(
            assignment_unit(1, d, window(10, 15, 10, 45), Resource::Register(1), 0, &[0, 1]),
            1,
        ),
        held(
            assignment_unit(2, d, window(10, 15, 10, 45), Resource::Register(1), 1, &[0, 1]),
            0,
        ),
    ];

    let score = score_with(model, Stage::Assignment, units, ResourceDoubleBooking);
    assert_eq!(score, HardSoftScore::of_hard(-1));
}

#[test]
fn test_requested_day_off() {
    let d = date(2025, 1, 10);
    let model = attendance().employee("E1").day_off("E1", d).model();
    let units = vec![
        held(attendance_unit(0, d, window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(1, date(2025, 1, 11), window(9, 0, 13, 0), &[0]), 0),
    ];

    let score = score_with(model, Stage::Attendance, units, RequestedDayOff);
    assert_eq!(score, HardSoftScore::of_hard(-1));
}

#[test]
fn test_weekly_off_and_base_window() {
    // 2025-01-10 is a Friday, 2025-01-11 a Saturday
    let model = attendance()
        .employee("E1")
        .weekly("E1", Weekday::Fri, WorkStyle::Off, None)
        .weekly("E1", Weekday::Sat, WorkStyle::Optional, Some(window(9, 0, 12, 0)))
        .model();
    let units = vec![
        held(attendance_unit(0, date(2025, 1, 10), window(9, 0, 11, 0), &[0]), 0),
        held(attendance_unit(1, date(2025, 1, 11), window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(2, date(2025, 1, 12), window(9, 0, 13, 0), &[0]), 0),
    ];

    let score = score_with(model, Stage::Attendance, units, WeeklyOffOrOutsideBase);
    assert_eq!(score, HardSoftScore::of_hard(-2));
}

#[test]
fn test_pattern_mismatch_per_stage() {
    let d = date(2025, 1, 10);
    let model = attendance()
        .employee("E1")
        .pattern("E1", "EARLY", window(9, 0, 13, 0), 3)
        .pattern("E1", "LATE", window(13, 0, 17, 0), 1)
        .model();
    let units = vec![
        held(attendance_unit(0, d, window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(1, date(2025, 1, 11), window(13, 0, 17, 0), &[0]), 0),
    ];
    let score = score_with(model, Stage::Attendance, units, PatternMismatch { min_priority: 2 });
    assert_eq!(score, HardSoftScore::of_hard(-1));

    let model = assignment()
        .employee("E1")
        .roster("E1", d, window(9, 0, 13, 0))
        .model();
    let units = vec![
        held(assignment_unit(0, d, window(12, 45, 13, 0), Resource::Register(1), 0, &[0]), 0),
        held(assignment_unit(1, d, window(13, 0, 13, 15), Resource::Register(1), 0, &[0]), 0),
    ];
    let score = score_with(model, Stage::Assignment, units, PatternMismatch { min_priority: 2 });
    assert_eq!(score, HardSoftScore::of_hard(-1));
}

#[test]
fn test_skill_disqualified() {
    let d = date(2025, 1, 10);
    let model = assignment()
        .employee("E1")
        .register_skill("E1", 1, 1)
        .register_skill("E1", 2, 3)
        .model();
    let units = vec![
        held(assignment_unit(0, d, window(10, 0, 10, 15), Resource::Register(1), 0, &[0]), 0),
        held(assignment_unit(1, d, window(10, 15, 10, 30), Resource::Register(2), 0, &[0]), 0),
        held(assignment_unit(2, d, window(10, 30, 10, 45), Resource::Register(3), 0, &[0]), 0),
    ];

    let score = score_with(model, Stage::Assignment, units, SkillDisqualified { min_level: 2 });
    assert_eq!(score, HardSoftScore::of_hard(-1));
}

#[test]
fn test_weekly_and_monthly_caps() {
    let limits = WorkLimits {
        max_minutes_week: Some(600),
        max_minutes_month: Some(900),
        ..WorkLimits::default()
    };
    let model = Arc::new(attendance().employee_with_limits("E1", limits).model());
    // Mon 6th..Wed 8th: 720 minutes in one week; Mon 13th adds 240 to the month
    let units = vec![
        held(attendance_unit(0, date(2025, 1, 6), window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(1, date(2025, 1, 7), window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(2, date(2025, 1, 8), window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(3, date(2025, 1, 13), window(9, 0, 13, 0), &[0]), 0),
    ];

    let weekly = IncrementalDirector::new(
        model.clone(),
        Schedule::new(Stage::Attendance, units.clone()),
        RuleSet::new().with_rule(WeeklyMinutesCap),
    );
    assert_eq!(weekly.score(), HardSoftScore::of_hard(-120));

    let monthly = IncrementalDirector::new(
        model,
        Schedule::new(Stage::Attendance, units),
        RuleSet::new().with_rule(MonthlyMinutesCap),
    );
    assert_eq!(monthly.score(), HardSoftScore::of_hard(-60));
}

#[test]
fn test_consecutive_days_counts_roster_lead_in() {
    let mut builder = attendance().employee("E1");
    for day in 26..=31 {
        builder = builder.roster("E1", date(2024, 12, day), window(9, 0, 17, 0));
    }
    let model = builder.model();
    let units = vec![
        held(attendance_unit(0, date(2025, 1, 1), window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(1, date(2025, 1, 2), window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(2, date(2025, 1, 4), window(9, 0, 13, 0), &[0]), 0),
    ];

    // the 1st and 2nd both follow six attended days
    let score = score_with(model, Stage::Attendance, units, ConsecutiveDays { cap: 6 });
    assert_eq!(score, HardSoftScore::of_hard(-2));
}

#[test]
fn test_monthly_off_days_without_units() {
    let limits = WorkLimits {
        max_off_days_month: Some(29),
        ..WorkLimits::default()
    };
    let model = attendance().employee_with_limits("E1", limits).model();

    // no work at all: 31 off days in January
    let score = score_with(model, Stage::Attendance, Vec::new(), MonthlyOffDays);
    assert_eq!(score, HardSoftScore::of_hard(-2));
}

#[test]
fn test_attendance_group_min_on_duty() {
    let d = date(2025, 1, 10);
    let model = attendance()
        .employee("E1")
        .employee("E2")
        .cycle_end(date(2025, 1, 11))
        .group("G1", GroupRule::MinOnDuty { min: 2 }, &["E1", "E2"])
        .model();
    let model = Arc::new(model);

    // the cycle is 1st..10th: every date short by two except the 10th
    let units = vec![held(attendance_unit(0, d, window(9, 0, 13, 0), &[0, 1]), 0)];
    let director = IncrementalDirector::new(
        model,
        Schedule::new(Stage::Attendance, units),
        RuleSet::new().with_rule(AttendanceGroupRule),
    );
    assert_eq!(director.score(), HardSoftScore::of_hard(-(9 * 2 + 1)));
    assert_eq!(director.score(), director.calculate_full());
}

// ============================================================================
// Soft rules
// ============================================================================

#[test]
fn test_overstaffing() {
    let d = date(2025, 1, 10);
    let model = attendance()
        .employee("E1")
        .employee("E2")
        .demand(d, time(10, 0), Some(Resource::Register(1)), 1)
        .model();
    let units = vec![
        held(attendance_unit(0, d, window(9, 0, 13, 0), &[0, 1]), 0),
        held(attendance_unit(1, d, window(9, 30, 11, 0), &[0, 1]), 1),
    ];
    let rule = HeadcountBalance {
        balance_weight: 200,
        overstaff_weight: 10,
        uncovered_weight: 120,
    };

    let score = score_with(model, Stage::Attendance, units, rule);
    assert_eq!(score, HardSoftScore::of_soft(-210));
}

#[test]
fn test_attendance_demand_sums_equal_times() {
    let d = date(2025, 1, 10);
    let model = attendance()
        .employee("E1")
        .demand(d, time(10, 0), Some(Resource::Register(1)), 1)
        .demand(d, time(10, 0), Some(Resource::Register(2)), 1)
        .model();
    let units = vec![held(attendance_unit(0, d, window(9, 0, 13, 0), &[0]), 0)];
    let rule = HeadcountBalance {
        balance_weight: 200,
        overstaff_weight: 10,
        uncovered_weight: 120,
    };

    // one point requiring two, covered once
    let score = score_with(model, Stage::Attendance, units, rule);
    assert_eq!(score, HardSoftScore::of_soft(-400));
}

#[test]
fn test_workload_balance_is_quadratic() {
    let model = attendance().employee("E1").employee("E2").model();
    let units = vec![
        held(attendance_unit(0, date(2025, 1, 6), window(9, 0, 13, 0), &[0, 1]), 0),
        held(attendance_unit(1, date(2025, 1, 7), window(9, 0, 13, 0), &[0, 1]), 0),
        held(attendance_unit(2, date(2025, 1, 8), window(9, 0, 13, 0), &[0, 1]), 1),
    ];

    let score = score_with(model, Stage::Attendance, units, WorkloadBalance { weight: 5 });
    assert_eq!(score, HardSoftScore::of_soft(-(5 * 4 + 5)));
}

#[test]
fn test_fragmentation_gap_threshold() {
    let d = date(2025, 1, 10);
    let model = assignment().employee("E1").model();
    let r = || Resource::Register(1);
    let units = vec![
        held(assignment_unit(0, d, window(10, 0, 10, 15), r(), 0, &[0]), 0),
        // 15-minute gap keeps one block
        held(assignment_unit(1, d, window(10, 30, 10, 45), r(), 0, &[0]), 0),
        // 30-minute gap starts a second block
        held(assignment_unit(2, d, window(11, 15, 11, 30), r(), 0, &[0]), 0),
    ];

    let score = score_with(
        model,
        Stage::Assignment,
        units,
        Fragmentation {
            weight: 1,
            gap_minutes: 15,
        },
    );
    assert_eq!(score, HardSoftScore::of_soft(-1));
}

#[test]
fn test_missing_break() {
    let d = date(2025, 1, 10);
    let rule = MissingBreak {
        weight: 50,
        threshold_minutes: 360,
        break_minutes: 60,
    };
    let model = assignment().employee("E1").model();
    let straight = vec![held(
        assignment_unit(0, d, window(9, 0, 16, 0), Resource::Register(1), 0, &[0]),
        0,
    )];
    assert_eq!(
        score_with(model, Stage::Assignment, straight, rule),
        HardSoftScore::of_soft(-50)
    );

    let model = assignment().employee("E1").model();
    let with_break = vec![
        held(assignment_unit(0, d, window(9, 0, 12, 30), Resource::Register(1), 0, &[0]), 0),
        held(assignment_unit(1, d, window(13, 30, 17, 0), Resource::Register(1), 0, &[0]), 0),
    ];
    assert_eq!(
        score_with(model, Stage::Assignment, with_break, rule),
        HardSoftScore::ZERO
    );
}

#[test]
fn test_handoff_churn() {
    let d = date(2025, 1, 10);
    let model = assignment().employee("E1").employee("E2").model();
    let r = || Resource::Register(1);
    let units = vec![
        held(assignment_unit(0, d, window(10, 0, 10, 15), r(), 0, &[0, 1]), 0),
        held(assignment_unit(1, d, window(10, 15, 10, 30), r(), 0, &[0, 1]), 0),
        held(assignment_unit(2, d, window(10, 30, 10, 45), r(), 0, &[0, 1]), 1),
        assignment_unit(3, d, window(10, 45, 11, 0), r(), 0, &[0, 1]),
        held(assignment_unit(4, d, window(11, 0, 11, 15), r(), 0, &[0, 1]), 0),
    ];

    let score = score_with(model, Stage::Assignment, units, HandoffChurn { weight: 2 });
    assert_eq!(score, HardSoftScore::of_soft(-2));
}

#[test]
fn test_daily_workers_counts_distinct_employees_per_date() {
    let d = date(2025, 1, 10);
    let model = Arc::new(assignment().employee("E1").employee("E2").model());
    let r = || Resource::Register(1);
    let units = vec![
        held(assignment_unit(0, d, window(10, 0, 10, 15), r(), 0, &[0, 1]), 0),
        held(assignment_unit(1, d, window(10, 15, 10, 30), r(), 0, &[0, 1]), 0),
        held(assignment_unit(2, d, window(10, 30, 10, 45), r(), 0, &[0, 1]), 1),
        held(assignment_unit(3, date(2025, 1, 11), window(10, 0, 10, 15), r(), 0, &[0, 1]), 1),
    ];
    let mut director = IncrementalDirector::new(
        model,
        Schedule::new(Stage::Assignment, units),
        RuleSet::new().with_rule(DailyWorkers { weight: 10 }),
    );

    // two people on the 10th, one on the 11th
    assert_eq!(director.score(), HardSoftScore::of_soft(-30));

    let merged = director
        .begin_change(shiftplan_core::UnitId(2))
        .commit(Some(EmployeeId(0)))
        .unwrap();
    assert_eq!(merged, HardSoftScore::of_soft(-20));
    assert_eq!(merged, director.calculate_full());

    let cleared = director
        .begin_change(shiftplan_core::UnitId(3))
        .commit(None)
        .unwrap();
    assert_eq!(cleared, HardSoftScore::of_soft(-10));
    assert_eq!(cleared, director.calculate_full());
}

#[test]
fn test_monthly_work_days() {
    let limits = WorkLimits {
        max_work_days_month: Some(1),
        ..WorkLimits::default()
    };
    let model = attendance().employee_with_limits("E1", limits).model();
    let units = vec![
        held(attendance_unit(0, date(2025, 1, 6), window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(1, date(2025, 1, 7), window(9, 0, 13, 0), &[0]), 0),
        held(attendance_unit(2, date(2025, 1, 7), window(14, 0, 15, 0), &[0]), 0),
    ];

    let score = score_with(model, Stage::Attendance, units, MonthlyWorkDays { weight: 100 });
    assert_eq!(score, HardSoftScore::of_soft(-100));
}

#[test]
fn test_pattern_priority() {
    let model = attendance()
        .employee("E1")
        .pattern("E1", "EARLY", window(9, 0, 13, 0), 2)
        .pattern("E1", "DAY", window(9, 0, 17, 0), 3)
        .model();
    let units = vec![held(attendance_unit(0, date(2025, 1, 6), window(9, 0, 13, 0), &[0]), 0)];
    let rule = PatternPriority {
        weight: 10,
        max_priority: 4,
        min_priority: 2,
    };

    let score = score_with(model, Stage::Attendance, units, rule);
    assert_eq!(score, HardSoftScore::of_soft(-10));
}

#[test]
fn test_minutes_shortfall_skips_month_crossing_weeks() {
    let limits = WorkLimits {
        min_minutes_week: Some(240),
        ..WorkLimits::default()
    };
    let model = attendance().employee_with_limits("E1", limits).model();
    // January 2025 holds three full Monday-to-Sunday weeks: 6th, 13th, 20th
    let units = vec![held(attendance_unit(0, date(2025, 1, 6), window(9, 0, 13, 0), &[0]), 0)];

    let score = score_with(model, Stage::Attendance, units, MinutesShortfall { weight: 5 });
    assert_eq!(score, HardSoftScore::of_soft(-(2 * 240 * 5)));
}

#[test]
fn test_stage_rule_sets() {
    let config = SolverConfig::default();
    let attendance = RuleSet::for_stage(Stage::Attendance, &config).names();
    let assignment = RuleSet::for_stage(Stage::Assignment, &config).names();

    assert!(attendance.contains(&"attendance_group"));
    assert!(attendance.contains(&"pattern_priority"));
    assert!(!attendance.contains(&"handoff_churn"));
    assert!(assignment.contains(&"handoff_churn"));
    assert!(assignment.contains(&"daily_workers"));
    assert!(!attendance.contains(&"daily_workers"));
    assert!(assignment.contains(&"resource_double_booking"));
    assert!(!assignment.contains(&"attendance_group"));
    assert!(assignment.contains(&"employee_overlap"));
}

#[test]
fn test_register_metadata_does_not_affect_scoring() {
    let d = date(2025, 1, 10);
    let model = assignment()
        .employee("E1")
        .register(RegisterInfo {
            number: 1,
            auto_open_target: true,
            open_priority: Some(1),
            max_allowance_minutes: Some(30),
        })
        .model();
    let units = vec![held(
        assignment_unit(0, d, window(10, 0, 10, 15), Resource::Register(1), 0, &[0]),
        0,
    )];
    let score = score_with(model, Stage::Assignment, units, UnassignedMandatory);
    assert_eq!(score, HardSoftScore::ZERO);
}
