//! Tests for moves, the selector and the local search loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shiftplan_config::{AcceptorConfig, MoveConfig, SolverConfig};
use shiftplan_core::{DomainModel, EmployeeId, Schedule, ShiftPlanError, Stage, UnitId};
use shiftplan_scoring::{IncrementalDirector, RuleSet};
use shiftplan_test::{attendance_unit, date, time, window, SnapshotBuilder};
use tokio::sync::mpsc;

use super::*;
use crate::construction::{AttendanceConstructor, Constructor};
use crate::eligibility::EligibilityEngine;
use crate::termination::{MoveCountTermination, OrTermination};
use crate::units::build_units;

fn prepared(model: DomainModel, config: &SolverConfig) -> IncrementalDirector {
    let stage = model.stage();
    let mut units = build_units(&model, config);
    EligibilityEngine::new(&model, &config.eligibility)
        .annotate(stage, &mut units)
        .unwrap();
    IncrementalDirector::new(
        Arc::new(model),
        Schedule::new(stage, units),
        RuleSet::for_stage(stage, config),
    )
}

fn fortnight() -> DomainModel {
    let mut builder = SnapshotBuilder::new("S1", date(2025, 1, 1), Stage::Attendance)
        .employee("E1")
        .employee("E2")
        .employee("E3")
        .pattern("E1", "EARLY", window(9, 0, 13, 0), 3)
        .pattern("E1", "LATE", window(13, 0, 17, 0), 2)
        .pattern("E2", "LATE", window(13, 0, 17, 0), 4)
        .pattern("E2", "DAY", window(9, 0, 17, 0), 2)
        .pattern("E3", "EARLY", window(9, 0, 13, 0), 2)
        .pattern("E3", "DAY", window(9, 0, 17, 0), 3)
        .prefer_on("E1", date(2025, 1, 10), window(13, 0, 17, 0));
    for day in 6..=19 {
        let d = date(2025, 1, day);
        builder = builder
            .demand(d, time(10, 0), None, 1)
            .demand(d, time(15, 0), None, 2);
    }
    builder.model()
}

fn hand_made() -> IncrementalDirector {
    let model = SnapshotBuilder::new("S1", date(2025, 1, 1), Stage::Attendance)
        .employee("E1")
        .employee("E2")
        .model();
    let d = date(2025, 1, 10);
    let units = vec![
        attendance_unit(0, d, window(9, 0, 13, 0), &[0, 1]),
        attendance_unit(1, d, window(13, 0, 17, 0), &[0, 1]),
        attendance_unit(2, d, window(9, 0, 17, 0), &[1]),
    ];
    IncrementalDirector::new(
        Arc::new(model),
        Schedule::new(Stage::Attendance, units),
        RuleSet::for_stage(Stage::Attendance, &SolverConfig::default()),
    )
}

fn bounded(moves: u64) -> SolverConfig {
    SolverConfig::new()
        .with_random_seed(1)
        .with_move_count_limit(moves)
}

// ============================================================================
// Moves
// ============================================================================

#[test]
fn test_change_move_applies_and_reverts() {
    let mut director = hand_made();
    let before = director.score();
    let mv = ScheduleMove::Change {
        unit: UnitId(0),
        to: Some(EmployeeId(1)),
    };

    assert!(mv.is_doable(&director));
    let undo = mv.do_move(&mut director).unwrap();
    assert_eq!(director.unit(UnitId(0)).assigned, Some(EmployeeId(1)));
    undo.revert(&mut director).unwrap();

    assert_eq!(director.unit(UnitId(0)).assigned, None);
    assert_eq!(director.score(), before);
}

#[test]
fn test_change_to_non_candidate_is_not_doable() {
    let director = hand_made();
    let mv = ScheduleMove::Change {
        unit: UnitId(2),
        to: Some(EmployeeId(0)),
    };
    assert!(!mv.is_doable(&director));

    let same = ScheduleMove::Change {
        unit: UnitId(0),
        to: None,
    };
    assert!(!same.is_doable(&director));
}

#[test]
fn test_swap_requires_mutual_candidates() {
    let mut director = hand_made();
    ScheduleMove::Change {
        unit: UnitId(0),
        to: Some(EmployeeId(0)),
    }
    .do_move(&mut director)
    .unwrap();
    ScheduleMove::Change {
        unit: UnitId(1),
        to: Some(EmployeeId(1)),
    }
    .do_move(&mut director)
    .unwrap();
    ScheduleMove::Change {
        unit: UnitId(2),
        to: Some(EmployeeId(1)),
    }
    .do_move(&mut director)
    .unwrap();

    // unit 2 only lists E2
    let blocked = ScheduleMove::Swap {
        left: UnitId(0),
        right: UnitId(2),
    };
    assert!(!blocked.is_doable(&director));
    ScheduleMove::Change {
        unit: UnitId(2),
        to: None,
    }
    .do_move(&mut director)
    .unwrap();

    let swap = ScheduleMove::Swap {
        left: UnitId(0),
        right: UnitId(1),
    };
    assert!(swap.is_doable(&director));
    let before = director.score();
    let undo = swap.do_move(&mut director).unwrap();
    assert_eq!(director.unit(UnitId(0)).assigned, Some(EmployeeId(1)));
    assert_eq!(director.unit(UnitId(1)).assigned, Some(EmployeeId(0)));
    assert_eq!(director.score(), director.calculate_full());

    undo.revert(&mut director).unwrap();
    assert_eq!(director.unit(UnitId(0)).assigned, Some(EmployeeId(0)));
    assert_eq!(director.score(), before);
}

#[test]
fn test_move_on_pinned_unit_fails_cleanly() {
    let mut director = hand_made();
    director.pin(UnitId(1)).unwrap();
    let swap = ScheduleMove::Swap {
        left: UnitId(0),
        right: UnitId(1),
    };
    assert!(!swap.is_doable(&director));

    let err = ScheduleMove::Change {
        unit: UnitId(1),
        to: Some(EmployeeId(0)),
    }
    .do_move(&mut director)
    .unwrap_err();
    assert!(matches!(err, ShiftPlanError::PinnedUnit(_)));
}

#[test]
fn test_change_into_overlap_is_not_doable() {
    let mut director = hand_made();
    ScheduleMove::Change {
        unit: UnitId(2),
        to: Some(EmployeeId(1)),
    }
    .do_move(&mut director)
    .unwrap();

    // E2 holds 09:00-17:00, which overlaps both halves of the day
    for unit in [UnitId(0), UnitId(1)] {
        let mv = ScheduleMove::Change {
            unit,
            to: Some(EmployeeId(1)),
        };
        assert!(!mv.is_doable(&director));
    }
    let elsewhere = ScheduleMove::Change {
        unit: UnitId(0),
        to: Some(EmployeeId(0)),
    };
    assert!(elsewhere.is_doable(&director));
}

#[test]
fn test_swap_into_overlap_is_not_doable() {
    let model = SnapshotBuilder::new("S1", date(2025, 1, 1), Stage::Attendance)
        .employee("E1")
        .employee("E2")
        .model();
    let d = date(2025, 1, 10);
    let mut units = vec![
        attendance_unit(0, d, window(9, 0, 13, 0), &[0, 1]),
        attendance_unit(1, d, window(13, 0, 17, 0), &[0, 1]),
        attendance_unit(2, d, window(14, 0, 16, 0), &[0]),
    ];
    units[0].assigned = Some(EmployeeId(0));
    units[1].assigned = Some(EmployeeId(1));
    units[2].assigned = Some(EmployeeId(0));
    let director = IncrementalDirector::new(
        Arc::new(model),
        Schedule::new(Stage::Attendance, units),
        RuleSet::for_stage(Stage::Attendance, &SolverConfig::default()),
    );

    // E1 would take 13:00-17:00 on top of its own 14:00-16:00
    let swap = ScheduleMove::Swap {
        left: UnitId(0),
        right: UnitId(1),
    };
    assert!(!swap.is_doable(&director));
    assert_eq!(held_overlaps(&director), 0);
}

// ============================================================================
// Selector
// ============================================================================

#[test]
fn test_pinned_prefer_on_unit_leaves_move_domain() {
    let config = SolverConfig::default();
    let mut director = prepared(fortnight(), &config);
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    AttendanceConstructor::new(&config)
        .construct(&mut director, &mut rng)
        .unwrap();

    let pinned: Vec<UnitId> = director
        .units()
        .iter()
        .filter(|u| u.pinned)
        .map(|u| u.id)
        .collect();
    assert_eq!(pinned.len(), 1);

    let selector = MoveSelector::new(&director, config.moves.clone());
    assert!(!selector.movable().contains(&pinned[0]));

    for _ in 0..500 {
        let mv = selector.next_move(&director, &mut rng).unwrap();
        match mv {
            ScheduleMove::Change { unit, .. } => assert_ne!(unit, pinned[0]),
            ScheduleMove::Swap { left, right } => {
                assert_ne!(left, pinned[0]);
                assert_ne!(right, pinned[0]);
            }
        }
    }
}

#[test]
fn test_selector_only_draws_doable_moves() {
    let director = hand_made();
    let selector = MoveSelector::new(
        &director,
        MoveConfig {
            swap_probability: 0.5,
            ..MoveConfig::default()
        },
    );
    let mut rng = ChaCha8Rng::seed_from_u64(8);

    for _ in 0..200 {
        let mv = selector.next_move(&director, &mut rng).unwrap();
        assert!(mv.is_doable(&director));
    }
}

// ============================================================================
// Search loop
// ============================================================================

#[test]
fn test_search_keeps_pinned_unit_and_improves() {
    let config = bounded(2_000);
    let mut director = prepared(fortnight(), &config);
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    AttendanceConstructor::new(&config)
        .construct(&mut director, &mut rng)
        .unwrap();
    let constructed = director.score();
    let pinned = director.units().iter().find(|u| u.pinned).unwrap().id;

    let mut search =
        LocalSearch::from_config(&config, Arc::new(AtomicBool::new(false)), 9).unwrap();
    let outcome = search.run(&mut director, &mut rng).unwrap();

    assert_eq!(outcome.moves, 2_000);
    assert!(outcome.score >= constructed);
    assert_eq!(outcome.best.score, Some(outcome.score));
    assert_eq!(outcome.best.unit(pinned).assigned, Some(EmployeeId(0)));
    assert!(!outcome.cancelled);
    assert_eq!(director.score(), director.calculate_full());
}

#[test]
fn test_hill_climbing_never_worsens_hard_score() {
    let config = bounded(1_000).with_acceptor(AcceptorConfig::HillClimbing);
    let mut director = prepared(fortnight(), &config);
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    AttendanceConstructor::new(&config)
        .construct(&mut director, &mut rng)
        .unwrap();
    let start = director.score();

    let mut search = LocalSearch::new(
        config.moves.clone(),
        Box::new(HillClimbingAcceptor),
        Box::new(OrTermination::new().with(MoveCountTermination::new(1_000))),
    );
    let outcome = search.run(&mut director, &mut rng).unwrap();

    // hill climbing walks only sideways or up, so the working score is the best
    assert!(director.score() >= start);
    assert_eq!(director.score(), outcome.score);
    assert!(director.score().hard() >= start.hard());
}

fn held_overlaps(director: &IncrementalDirector) -> usize {
    director
        .analyze()
        .constraint("employee_overlap")
        .map_or(0, |c| c.match_count)
}

/// One employee, two overlapping patterns, both windows needed.
fn overlapping_day() -> (DomainModel, SolverConfig) {
    let d = date(2025, 1, 10);
    let model = SnapshotBuilder::new("S1", date(2025, 1, 1), Stage::Attendance)
        .employee("E1")
        .pattern("E1", "EARLY", window(9, 0, 13, 0), 3)
        .pattern("E1", "MID", window(12, 0, 16, 0), 3)
        .demand(d, time(10, 0), None, 1)
        .demand(d, time(14, 0), None, 1)
        .model();
    let mut config = bounded(200).with_acceptor(AcceptorConfig::HillClimbing);
    config.scoring.attendance_units_mandatory = true;
    (model, config)
}

#[test]
fn test_accepted_steps_never_overlap_an_employee() {
    let (model, config) = overlapping_day();
    let mut director = prepared(model, &config);
    assert_eq!(director.units().len(), 2);
    let selector = MoveSelector::new(&director, config.moves.clone());
    let mut acceptor = HillClimbingAcceptor;
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    for _ in 0..200 {
        let Some(mv) = selector.next_move(&director, &mut rng) else {
            break;
        };
        let last = director.score();
        let undo = mv.do_move(&mut director).unwrap();
        if acceptor.is_accepted(&last, &director.score()) {
            assert_eq!(held_overlaps(&director), 0, "accepted {}", mv);
        } else {
            undo.revert(&mut director).unwrap();
        }
    }
    assert_eq!(director.schedule().assigned_count(), 1);
}

#[test]
fn test_search_best_never_overlaps_an_employee() {
    let (model, config) = overlapping_day();
    let mut director = prepared(model, &config);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let mut search =
        LocalSearch::from_config(&config, Arc::new(AtomicBool::new(false)), 1).unwrap();
    let outcome = search.run(&mut director, &mut rng).unwrap();

    assert_eq!(outcome.best.assigned_count(), 1);
    assert_eq!(outcome.score.hard(), -1);
    assert_eq!(held_overlaps(&director), 0);
}

#[test]
fn test_cancelled_search_stops_before_first_move() {
    let config = bounded(1_000);
    let mut director = prepared(fortnight(), &config);
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let cancel = Arc::new(AtomicBool::new(true));

    let mut search = LocalSearch::from_config(&config, Arc::clone(&cancel), 0).unwrap();
    let outcome = search.run(&mut director, &mut rng).unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.moves, 0);
    assert_eq!(outcome.score, director.score());
    cancel.store(false, Ordering::SeqCst);
}

#[test]
fn test_progress_channel_reports_improving_scores() {
    let config = bounded(1_500);
    let mut director = prepared(fortnight(), &config);
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let mut search = LocalSearch::from_config(&config, Arc::new(AtomicBool::new(false)), 3)
        .unwrap()
        .with_progress(sender);
    let outcome = search.run(&mut director, &mut rng).unwrap();
    drop(search);

    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    assert!(events.len() >= 2);
    assert!(events.windows(2).all(|w| w[0].score < w[1].score));
    let last = events.last().unwrap();
    assert_eq!(last.score, outcome.score);
    assert_eq!(last.schedule, outcome.best);
}

#[test]
fn test_seeded_search_is_reproducible() {
    let run = || {
        let config = bounded(800);
        let mut director = prepared(fortnight(), &config);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        AttendanceConstructor::new(&config)
            .construct(&mut director, &mut rng)
            .unwrap();
        let mut search =
            LocalSearch::from_config(&config, Arc::new(AtomicBool::new(false)), 5).unwrap();
        search.run(&mut director, &mut rng).unwrap().best
    };
    assert_eq!(run(), run());
}
