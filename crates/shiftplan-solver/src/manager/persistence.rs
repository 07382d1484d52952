//! Persistence collaborators of the job pipeline.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use shiftplan_core::domain::{AssignmentRow, AttendanceRow};
use shiftplan_core::{ProblemKey, ProblemSnapshot, Result, ShiftPlanError, Stage};
use tracing::debug;

/// Supplies the raw inputs of a problem.
pub trait ProblemSource: Send + Sync {
    /// Loads the snapshot for `key`.
    ///
    /// # Errors
    ///
    /// `Validation` when nothing is known for `key`.
    fn load(&self, key: &ProblemKey) -> Result<ProblemSnapshot>;
}

/// Receives the rows of finished jobs.
///
/// Both writes replace every row of the key's store and department whose
/// date falls in `dates`, then insert `rows`. A failed write leaves the
/// previous rows untouched.
pub trait ResultSink: Send + Sync {
    fn replace_attendance(
        &self,
        key: &ProblemKey,
        dates: Range<NaiveDate>,
        rows: &[AttendanceRow],
    ) -> Result<()>;

    fn replace_assignments(
        &self,
        key: &ProblemKey,
        dates: Range<NaiveDate>,
        rows: &[AssignmentRow],
    ) -> Result<()>;
}

/// Rows are partitioned by store and department.
type Scope = (String, Option<String>);

fn scope_of(key: &ProblemKey) -> Scope {
    (key.store_code.clone(), key.department_code.clone())
}

/// Snapshot lookup ignores the stage.
fn snapshot_key(key: &ProblemKey) -> ProblemKey {
    key.with_stage(Stage::Attendance)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process [`ProblemSource`] and [`ResultSink`].
///
/// One snapshot serves both stages of a store, cycle and department.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshots: Mutex<HashMap<ProblemKey, ProblemSnapshot>>,
    attendance: Mutex<HashMap<Scope, Vec<AttendanceRow>>>,
    assignments: Mutex<HashMap<Scope, Vec<AssignmentRow>>>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `snapshot` under its key, replacing any previous one.
    pub fn put_snapshot(&self, snapshot: ProblemSnapshot) {
        lock(&self.snapshots).insert(snapshot_key(&snapshot.key), snapshot);
    }

    /// Makes every following write fail until switched off again.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Attendance rows stored for the key's store and department.
    pub fn attendance_rows(&self, key: &ProblemKey) -> Vec<AttendanceRow> {
        lock(&self.attendance)
            .get(&scope_of(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Assignment rows stored for the key's store and department.
    pub fn assignment_rows(&self, key: &ProblemKey) -> Vec<AssignmentRow> {
        lock(&self.assignments)
            .get(&scope_of(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Writes into a staged copy of the scope's rows and swaps it in only
    /// once every step succeeded.
    fn replace<T: Clone>(
        &self,
        table: &Mutex<HashMap<Scope, Vec<T>>>,
        key: &ProblemKey,
        dates: Range<NaiveDate>,
        rows: &[T],
        date_of: impl Fn(&T) -> NaiveDate,
    ) -> Result<()> {
        let scope = scope_of(key);
        let mut table = lock(table);
        let mut staged: Vec<T> = table
            .get(&scope)
            .map(|existing| {
                existing
                    .iter()
                    .filter(|row| !dates.contains(&date_of(*row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let removed = table.get(&scope).map_or(0, Vec::len) - staged.len();

        if let Some(outside) = rows.iter().find(|row| !dates.contains(&date_of(*row))) {
            return Err(ShiftPlanError::Persistence(format!(
                "row dated {} lies outside {}..{}",
                date_of(outside),
                dates.start,
                dates.end
            )));
        }
        staged.extend_from_slice(rows);

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ShiftPlanError::Persistence(format!(
                "write for {} rejected by store",
                key
            )));
        }
        table.insert(scope, staged);
        debug!(
            event = "rows_replaced",
            key = %key,
            removed,
            inserted = rows.len(),
        );
        Ok(())
    }
}

impl ProblemSource for InMemoryStore {
    fn load(&self, key: &ProblemKey) -> Result<ProblemSnapshot> {
        let mut snapshot = lock(&self.snapshots)
            .get(&snapshot_key(key))
            .cloned()
            .ok_or_else(|| ShiftPlanError::Validation(format!("no problem data for {}", key)))?;
        snapshot.key = key.clone();
        Ok(snapshot)
    }
}

impl ResultSink for InMemoryStore {
    fn replace_attendance(
        &self,
        key: &ProblemKey,
        dates: Range<NaiveDate>,
        rows: &[AttendanceRow],
    ) -> Result<()> {
        self.replace(&self.attendance, key, dates, rows, |row| row.date)
    }

    fn replace_assignments(
        &self,
        key: &ProblemKey,
        dates: Range<NaiveDate>,
        rows: &[AssignmentRow],
    ) -> Result<()> {
        self.replace(&self.assignments, key, dates, rows, |row| row.date)
    }
}
