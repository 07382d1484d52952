//! Two-stage runs through the public API.

use std::collections::HashMap;
use std::sync::Arc;

use shiftplan_test::{date, window, SnapshotBuilder};

use crate::domain::{RegisterInfo, Resource};
use crate::prelude::*;
use crate::{ProblemSource, ResultSink};

fn store_week() -> ProblemSnapshot {
    let mut builder = SnapshotBuilder::new("S7", date(2025, 3, 1), Stage::Attendance)
        .cycle_end(date(2025, 3, 8))
        .employee("A")
        .employee("B")
        .employee("C")
        .pattern("A", "OPEN", window(8, 0, 12, 0), 3)
        .pattern("A", "MID", window(10, 0, 14, 0), 2)
        .pattern("B", "MID", window(10, 0, 14, 0), 3)
        .pattern("C", "OPEN", window(8, 0, 12, 0), 2)
        .pattern("C", "CLOSE", window(12, 0, 16, 0), 3)
        .register_skill("A", 1, 3)
        .register_skill("B", 1, 2)
        .register_skill("B", 2, 3)
        .register_skill("C", 2, 2)
        .register(RegisterInfo {
            number: 1,
            auto_open_target: true,
            open_priority: Some(1),
            max_allowance_minutes: None,
        })
        .register(RegisterInfo {
            number: 2,
            auto_open_target: false,
            open_priority: None,
            max_allowance_minutes: Some(60),
        });
    for day in 1..=7 {
        let d = date(2025, 3, day);
        builder = builder
            .demand_range(d, window(8, 0, 12, 0), Some(Resource::Register(1)), 1)
            .demand_range(d, window(11, 0, 15, 0), Some(Resource::Register(2)), 1);
    }
    builder.build()
}

fn manager(store: &Arc<InMemoryStore>) -> ShiftSolverManager {
    ShiftSolverManager::new(
        Arc::clone(store) as Arc<dyn ProblemSource>,
        Arc::clone(store) as Arc<dyn ResultSink>,
        SolverConfig::new()
            .with_random_seed(11)
            .with_move_count_limit(2_000),
    )
}

#[test]
fn test_two_stage_run_never_overlaps_an_employee() {
    let store = Arc::new(InMemoryStore::new());
    store.put_snapshot(store_week());
    let manager = manager(&store);

    let attendance = manager
        .submit("S7", date(2025, 3, 1), None, Stage::Attendance)
        .unwrap();
    let attended = manager.wait(attendance).unwrap();

    let mut per_day: HashMap<(&str, _), Vec<_>> = HashMap::new();
    for row in &attended.attendance {
        per_day
            .entry((row.employee_code.as_str(), row.date))
            .or_default()
            .push(row.window);
    }
    let attendance_overlap = per_day.values().any(|windows| {
        windows
            .iter()
            .enumerate()
            .any(|(i, a)| windows[i + 1..].iter().any(|b| a.overlaps(b)))
    });
    assert!(!attendance_overlap);

    let assignment = manager
        .submit("S7", date(2025, 3, 1), None, Stage::Assignment)
        .unwrap();
    let assigned = manager.wait(assignment).unwrap();

    assert!(!assigned.assignments.is_empty());
    let rows = &assigned.assignments;
    let assignment_overlap = rows.iter().enumerate().any(|(i, a)| {
        rows[i + 1..].iter().any(|b| {
            a.date == b.date && a.employee_code == b.employee_code && a.window.overlaps(&b.window)
        })
    });
    assert!(!assignment_overlap);
    assert_eq!(manager.status(assignment).unwrap().state, JobState::Completed);
}

#[test]
fn test_seeded_jobs_repeat() {
    let run = || {
        let store = Arc::new(InMemoryStore::new());
        store.put_snapshot(store_week());
        let manager = manager(&store);
        let job = manager
            .submit("S7", date(2025, 3, 1), None, Stage::Attendance)
            .unwrap();
        let result = manager.wait(job).unwrap();
        (result.score, result.attendance)
    };
    assert_eq!(run(), run());
}
