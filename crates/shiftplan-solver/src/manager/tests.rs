//! Tests for the job registry, the in-memory store and the solver manager.

use std::sync::Arc;

use shiftplan_config::SolverConfig;
use shiftplan_core::domain::{AttendanceRow, RegisterInfo, Resource};
use shiftplan_core::{JobId, ProblemKey, ProblemSnapshot, ShiftPlanError, Stage};
use shiftplan_test::{date, time, window, SnapshotBuilder};

use super::*;

fn key(stage: Stage) -> ProblemKey {
    ProblemKey::new("S1", date(2025, 1, 1), None, stage)
}

fn row(employee: &str, day: u32) -> AttendanceRow {
    AttendanceRow {
        employee_code: employee.to_string(),
        date: date(2025, 1, day),
        window: window(9, 0, 13, 0),
    }
}

/// Three days, two cashiers, one register open all morning.
fn small_store() -> ProblemSnapshot {
    let mut builder = SnapshotBuilder::new("S1", date(2025, 1, 1), Stage::Attendance)
        .cycle_end(date(2025, 1, 4))
        .employee("E1")
        .employee("E2")
        .pattern("E1", "AM", window(9, 0, 13, 0), 3)
        .pattern("E2", "AM", window(9, 0, 13, 0), 3)
        .pattern("E2", "PM", window(13, 0, 17, 0), 2)
        .register_skill("E1", 1, 3)
        .register_skill("E2", 1, 2)
        .register(RegisterInfo {
            number: 1,
            auto_open_target: true,
            open_priority: Some(1),
            max_allowance_minutes: Some(120),
        });
    for day in 1..=3 {
        builder = builder.demand_range(
            date(2025, 1, day),
            window(9, 0, 13, 0),
            Some(Resource::Register(1)),
            1,
        );
    }
    builder.build()
}

/// A month of demand, so a time-bounded search keeps running until cancelled.
fn busy_store() -> ProblemSnapshot {
    let mut builder = SnapshotBuilder::new("S1", date(2025, 1, 1), Stage::Attendance)
        .employee("E1")
        .employee("E2")
        .employee("E3")
        .pattern("E1", "AM", window(9, 0, 13, 0), 3)
        .pattern("E2", "PM", window(13, 0, 17, 0), 3)
        .pattern("E3", "DAY", window(9, 0, 17, 0), 2);
    for day in 1..=31 {
        builder = builder
            .demand(date(2025, 1, day), time(10, 0), None, 2)
            .demand(date(2025, 1, day), time(14, 0), None, 2);
    }
    builder.build()
}

fn manager(store: &Arc<InMemoryStore>, config: SolverConfig) -> ShiftSolverManager {
    ShiftSolverManager::new(
        Arc::clone(store) as Arc<dyn ProblemSource>,
        Arc::clone(store) as Arc<dyn ResultSink>,
        config,
    )
}

fn quick() -> SolverConfig {
    SolverConfig::new()
        .with_random_seed(7)
        .with_move_count_limit(300)
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_registry_one_active_job_per_key() {
    let registry = JobRegistry::new();
    let first = registry.try_register(key(Stage::Attendance)).unwrap();
    let other_stage = registry.try_register(key(Stage::Assignment)).unwrap();
    assert_ne!(first, other_stage);

    let err = registry.try_register(key(Stage::Attendance)).unwrap_err();
    assert!(matches!(err, ShiftPlanError::JobConflict(k) if k == key(Stage::Attendance)));
    assert_eq!(registry.active_count(), 2);

    assert_eq!(registry.release(&key(Stage::Attendance)), Some(first));
    assert!(!registry.is_active(&key(Stage::Attendance)));
    assert_eq!(registry.active_count(), 1);

    let again = registry.try_register(key(Stage::Attendance)).unwrap();
    assert!(again > other_stage);
    assert_eq!(registry.active_job(&key(Stage::Attendance)), Some(again));
}

#[test]
fn test_registry_forgets_released_jobs() {
    let registry = JobRegistry::new();
    let mut last = None;
    for _ in 0..100 {
        let job = registry.try_register(key(Stage::Assignment)).unwrap();
        assert!(last.map_or(true, |prev| job > prev));
        assert_eq!(registry.release(&key(Stage::Assignment)), Some(job));
        last = Some(job);
    }

    assert_eq!(registry.active_count(), 0);
    assert_eq!(registry.active_job(&key(Stage::Assignment)), None);
    assert_eq!(registry.release(&key(Stage::Assignment)), None);
}

// ============================================================================
// In-memory store
// ============================================================================

#[test]
fn test_store_load_ignores_stage_and_rejects_unknown() {
    let store = InMemoryStore::new();
    store.put_snapshot(small_store());

    let loaded = store.load(&key(Stage::Assignment)).unwrap();
    assert_eq!(loaded.key, key(Stage::Assignment));
    assert_eq!(loaded.employees.len(), 2);

    let other = ProblemKey::new("S2", date(2025, 1, 1), None, Stage::Attendance);
    assert!(matches!(
        store.load(&other),
        Err(ShiftPlanError::Validation(_))
    ));
}

#[test]
fn test_store_replaces_only_rows_in_range() {
    let store = InMemoryStore::new();
    let k = key(Stage::Attendance);
    store
        .replace_attendance(&k, date(2025, 1, 1)..date(2025, 1, 4), &[row("E1", 1), row("E1", 3)])
        .unwrap();

    store
        .replace_attendance(&k, date(2025, 1, 3)..date(2025, 1, 4), &[row("E2", 3)])
        .unwrap();

    let rows = store.attendance_rows(&k);
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&row("E1", 1)));
    assert!(rows.contains(&row("E2", 3)));

    let err = store
        .replace_attendance(&k, date(2025, 1, 1)..date(2025, 1, 2), &[row("E2", 5)])
        .unwrap_err();
    assert!(matches!(err, ShiftPlanError::Persistence(_)));
    assert_eq!(store.attendance_rows(&k).len(), 2);
}

#[test]
fn test_store_failed_write_keeps_prior_rows() {
    let store = InMemoryStore::new();
    let k = key(Stage::Attendance);
    store
        .replace_attendance(&k, date(2025, 1, 1)..date(2025, 1, 4), &[row("E1", 1)])
        .unwrap();

    store.fail_writes(true);
    let err = store
        .replace_attendance(&k, date(2025, 1, 1)..date(2025, 1, 4), &[])
        .unwrap_err();

    assert!(matches!(err, ShiftPlanError::Persistence(_)));
    assert_eq!(store.attendance_rows(&k), vec![row("E1", 1)]);
}

// ============================================================================
// Manager
// ============================================================================

#[test]
fn test_submit_unknown_problem_creates_no_job() {
    let store = Arc::new(InMemoryStore::new());
    let manager = manager(&store, quick());

    let err = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Attendance)
        .unwrap_err();

    assert!(matches!(err, ShiftPlanError::Validation(_)));
    assert!(manager.active_job(&key(Stage::Attendance)).is_none());
    assert!(matches!(
        manager.status(JobId(1)),
        Err(ShiftPlanError::JobNotFound(_))
    ));
}

#[test]
fn test_submit_rejects_invalid_snapshot() {
    let store = Arc::new(InMemoryStore::new());
    let mut snapshot = small_store();
    snapshot.slot_minutes = -5;
    store.put_snapshot(snapshot);
    let manager = manager(&store, quick());

    let err = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Attendance)
        .unwrap_err();

    assert!(matches!(err, ShiftPlanError::Validation(_)));
    assert!(manager.active_job(&key(Stage::Attendance)).is_none());
}

#[test]
fn test_attendance_job_completes_and_persists() {
    let store = Arc::new(InMemoryStore::new());
    store.put_snapshot(small_store());
    let manager = manager(&store, quick());

    let job = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Attendance)
        .unwrap();
    let receiver = manager.subscribe(job).unwrap();
    let result = manager.wait(job).unwrap();

    assert_eq!(result.job, job);
    assert_eq!(result.key, key(Stage::Attendance));
    assert!(!result.cancelled);
    assert!(!result.attendance.is_empty());
    assert!(result.assignments.is_empty());
    assert_eq!(store.attendance_rows(&result.key), result.attendance);

    let status = manager.status(job).unwrap();
    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.score(), Some(result.score));
    assert_eq!(receiver.borrow().state, JobState::Completed);
    assert!(manager.active_job(&result.key).is_none());
}

#[test]
fn test_second_submit_conflicts_until_cancelled() {
    let store = Arc::new(InMemoryStore::new());
    store.put_snapshot(busy_store());
    let manager = manager(&store, SolverConfig::new().with_termination_seconds(3600));

    let job = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Attendance)
        .unwrap();
    let err = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Attendance)
        .unwrap_err();
    assert!(matches!(err, ShiftPlanError::JobConflict(_)));

    match manager.result(job) {
        Err(ShiftPlanError::JobNotCompleted { job: j, state }) => {
            assert_eq!(j, job);
            assert!(state == "QUEUED" || state == "RUNNING");
        }
        other => panic!("expected JobNotCompleted, got {:?}", other.map(|r| r.score)),
    }

    manager.cancel(job).unwrap();
    let result = manager.wait(job).unwrap();
    assert!(result.cancelled);
    assert_eq!(manager.status(job).unwrap().state, JobState::Completed);

    // the key is free again
    let next = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Attendance)
        .unwrap();
    manager.cancel(next).unwrap();
    assert!(manager.wait(next).is_ok());
}

#[test]
fn test_persistence_failure_fails_job_and_keeps_rows() {
    let store = Arc::new(InMemoryStore::new());
    store.put_snapshot(small_store());
    let k = key(Stage::Attendance);
    store
        .replace_attendance(&k, date(2025, 1, 1)..date(2025, 1, 4), &[row("E9", 2)])
        .unwrap();
    store.fail_writes(true);
    let manager = manager(&store, quick());

    let job = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Attendance)
        .unwrap();
    let err = manager.wait(job).unwrap_err();

    assert!(matches!(err, ShiftPlanError::JobNotCompleted { ref state, .. } if state == "FAILED"));
    let status = manager.status(job).unwrap();
    assert_eq!(status.state, JobState::Failed);
    assert!(status.cause.unwrap().contains("Persistence"));
    assert_eq!(store.attendance_rows(&k), vec![row("E9", 2)]);
    assert!(manager.active_job(&k).is_none());

    store.fail_writes(false);
    let retry = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Attendance)
        .unwrap();
    let result = manager.wait(retry).unwrap();
    assert_eq!(store.attendance_rows(&k), result.attendance);
}

#[test]
fn test_assignment_uses_attendance_result() {
    let store = Arc::new(InMemoryStore::new());
    store.put_snapshot(small_store());
    let manager = manager(&store, quick());

    let attendance = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Attendance)
        .unwrap();
    let attended = manager.wait(attendance).unwrap().attendance;
    assert!(!attended.is_empty());

    let assignment = manager
        .submit("S1", date(2025, 1, 1), None, Stage::Assignment)
        .unwrap();
    let result = manager.wait(assignment).unwrap();

    assert!(result.attendance.is_empty());
    assert!(!result.assignments.is_empty());
    for row in &result.assignments {
        assert_eq!(row.resource, Resource::Register(1));
        assert!(
            attended.iter().any(|a| a.employee_code == row.employee_code
                && a.date == row.date
                && a.window.start <= row.window.start
                && row.window.end <= a.window.end),
            "{:?} has no attendance behind it",
            row
        );
    }
    assert_eq!(
        store.assignment_rows(&key(Stage::Assignment)),
        result.assignments
    );
}

#[test]
fn test_unknown_job_is_reported() {
    let store = Arc::new(InMemoryStore::new());
    let manager = manager(&store, quick());

    assert!(matches!(
        manager.cancel(JobId(42)),
        Err(ShiftPlanError::JobNotFound(JobId(42)))
    ));
    assert!(matches!(
        manager.wait(JobId(42)),
        Err(ShiftPlanError::JobNotFound(_))
    ));
    assert!(manager.subscribe(JobId(42)).is_err());
}
