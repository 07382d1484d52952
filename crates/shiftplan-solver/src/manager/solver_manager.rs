//! Background jobs over the solve pipeline.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use chrono::NaiveDate;
use shiftplan_config::SolverConfig;
use shiftplan_core::domain::AttendanceRow;
use shiftplan_core::{
    DomainModel, JobId, ProblemKey, ProblemSnapshot, Result, ShiftPlanError, Stage,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::job::{JobResult, JobState, JobStatus};
use super::persistence::{ProblemSource, ResultSink};
use super::registry::JobRegistry;
use crate::localsearch::BestSolutionEvent;
use crate::solver::{ShiftSolver, SolveOutput};

struct JobRecord {
    key: ProblemKey,
    status: watch::Sender<JobStatus>,
    cancel: Arc<AtomicBool>,
    result: Option<JobResult>,
}

struct Inner {
    source: Arc<dyn ProblemSource>,
    sink: Arc<dyn ResultSink>,
    config: SolverConfig,
    registry: JobRegistry,
    jobs: Mutex<HashMap<JobId, JobRecord>>,
    done: Condvar,
    /// Latest attendance rows per attendance key, fed to assignment jobs.
    retained: Mutex<HashMap<ProblemKey, Vec<AttendanceRow>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("solver panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("solver panicked: {}", s)
    } else {
        "solver panicked".to_string()
    }
}

/// Runs solve jobs on background threads, one active job per problem key.
///
/// A job loads its snapshot, solves it with [`ShiftSolver`], writes the
/// best schedule through the [`ResultSink`] and publishes a [`JobResult`].
/// Attendance results also become the roster of later assignment jobs for
/// the same store, cycle and department.
pub struct ShiftSolverManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for ShiftSolverManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShiftSolverManager")
            .field("config", &self.inner.config)
            .field("jobs", &lock(&self.inner.jobs).len())
            .field("active", &self.inner.registry.active_count())
            .finish_non_exhaustive()
    }
}

impl ShiftSolverManager {
    pub fn new(
        source: Arc<dyn ProblemSource>,
        sink: Arc<dyn ResultSink>,
        config: SolverConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                sink,
                config,
                registry: JobRegistry::new(),
                jobs: Mutex::new(HashMap::new()),
                done: Condvar::new(),
                retained: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.inner.config
    }

    /// Job currently holding `key`, if any.
    pub fn active_job(&self, key: &ProblemKey) -> Option<JobId> {
        self.inner.registry.active_job(key)
    }

    /// Validates the problem and starts solving it in the background.
    ///
    /// # Errors
    ///
    /// - `Validation` for an invalid configuration or snapshot; no job is
    ///   created
    /// - `JobConflict` when a job for the same key is still active
    /// - `Solver` when the job thread could not be started
    pub fn submit(
        &self,
        store_code: impl Into<String>,
        cycle_start: NaiveDate,
        department_code: Option<String>,
        stage: Stage,
    ) -> Result<JobId> {
        let key = ProblemKey::new(store_code, cycle_start, department_code, stage);
        self.inner
            .config
            .validate()
            .map_err(|e| ShiftPlanError::Validation(e.to_string()))?;

        let mut snapshot = self.inner.source.load(&key)?;
        snapshot.key = key.clone();
        if snapshot.slot_minutes == 0 {
            snapshot.slot_minutes = self.inner.config.construction.slot_minutes;
        }
        if stage == Stage::Assignment {
            self.inner.feed_roster(&mut snapshot);
        }
        let model = Arc::new(DomainModel::build(snapshot)?);

        let job = self.inner.registry.try_register(key.clone())?;
        let cancel = Arc::new(AtomicBool::new(false));
        let (status, _) = watch::channel(JobStatus::queued());
        lock(&self.inner.jobs).insert(
            job,
            JobRecord {
                key: key.clone(),
                status,
                cancel: Arc::clone(&cancel),
                result: None,
            },
        );
        info!(
            event = "job_submitted",
            job = %job,
            key = %key,
            employees = model.employees().len(),
            demand_slots = model.demand().len(),
        );

        let inner = Arc::clone(&self.inner);
        let job_key = key.clone();
        let spawned = thread::Builder::new()
            .name(format!("shiftplan-{}", job))
            .spawn(move || inner.run(job, job_key, model, cancel));
        if let Err(err) = spawned {
            lock(&self.inner.jobs).remove(&job);
            self.inner.registry.release(&key);
            return Err(ShiftPlanError::Solver(format!(
                "could not start {}: {}",
                job, err
            )));
        }
        Ok(job)
    }

    pub fn status(&self, job: JobId) -> Result<JobStatus> {
        let jobs = lock(&self.inner.jobs);
        let record = jobs.get(&job).ok_or(ShiftPlanError::JobNotFound(job))?;
        let status = record.status.borrow().clone();
        Ok(status)
    }

    /// Receiver that observes every status change of `job`.
    pub fn subscribe(&self, job: JobId) -> Result<watch::Receiver<JobStatus>> {
        let jobs = lock(&self.inner.jobs);
        let record = jobs.get(&job).ok_or(ShiftPlanError::JobNotFound(job))?;
        Ok(record.status.subscribe())
    }

    /// Result of a completed job.
    ///
    /// # Errors
    ///
    /// `JobNotCompleted` unless the job is `COMPLETED`.
    pub fn result(&self, job: JobId) -> Result<JobResult> {
        let jobs = lock(&self.inner.jobs);
        let record = jobs.get(&job).ok_or(ShiftPlanError::JobNotFound(job))?;
        completed_result(job, record)
    }

    /// Blocks until `job` is terminal, then behaves like [`result`](Self::result).
    pub fn wait(&self, job: JobId) -> Result<JobResult> {
        let mut jobs = lock(&self.inner.jobs);
        loop {
            let record = jobs.get(&job).ok_or(ShiftPlanError::JobNotFound(job))?;
            if record.status.borrow().state.is_terminal() {
                return completed_result(job, record);
            }
            jobs = self
                .inner
                .done
                .wait(jobs)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Asks `job` to stop. It completes with the best schedule found so far.
    pub fn cancel(&self, job: JobId) -> Result<()> {
        let jobs = lock(&self.inner.jobs);
        let record = jobs.get(&job).ok_or(ShiftPlanError::JobNotFound(job))?;
        record.cancel.store(true, Ordering::SeqCst);
        info!(
            event = "job_cancel_requested",
            job = %job,
            key = %record.key,
            state = %record.status.borrow().state,
        );
        Ok(())
    }
}

fn completed_result(job: JobId, record: &JobRecord) -> Result<JobResult> {
    let state = record.status.borrow().state;
    match (&record.result, state) {
        (Some(result), JobState::Completed) => Ok(result.clone()),
        _ => Err(ShiftPlanError::JobNotCompleted {
            job,
            state: state.to_string(),
        }),
    }
}

impl Inner {
    /// Replaces the snapshot's in-cycle roster with retained attendance
    /// rows, when an attendance job of the same problem has finished.
    fn feed_roster(&self, snapshot: &mut ProblemSnapshot) {
        let attendance_key = snapshot.key.with_stage(Stage::Attendance);
        let retained = lock(&self.retained);
        let Some(rows) = retained.get(&attendance_key) else {
            return;
        };
        let (start, end) = (snapshot.key.cycle_start, snapshot.cycle_end);
        snapshot.roster.retain(|e| e.date < start || e.date >= end);
        snapshot.roster.extend(rows.iter().cloned());
        debug!(
            event = "roster_fed",
            key = %snapshot.key,
            rows = rows.len(),
        );
    }

    fn update_status(&self, job: JobId, change: impl FnOnce(&JobStatus) -> JobStatus) {
        if let Some(record) = lock(&self.jobs).get(&job) {
            record.status.send_modify(|s| *s = change(s));
        }
    }

    fn run(
        self: Arc<Self>,
        job: JobId,
        key: ProblemKey,
        model: Arc<DomainModel>,
        cancel: Arc<AtomicBool>,
    ) {
        self.update_status(job, |s| s.with_state(JobState::Running));
        info!(event = "job_started", job = %job, key = %key);

        let (sender, mut receiver) = mpsc::unbounded_channel::<BestSolutionEvent>();
        let forward = {
            let inner = Arc::clone(&self);
            thread::Builder::new()
                .name(format!("shiftplan-{}-progress", job))
                .spawn(move || {
                    while let Some(event) = receiver.blocking_recv() {
                        inner.update_status(job, |s| s.with_score(event.score));
                    }
                })
        };
        let forwarder = match forward {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(event = "progress_unavailable", job = %job, error = %err);
                None
            }
        };

        let solver = ShiftSolver::new(self.config.clone()).with_progress(sender);
        let solved = panic::catch_unwind(AssertUnwindSafe(|| {
            solver.solve(Arc::clone(&model), Arc::clone(&cancel))
        }));
        drop(solver);
        if let Some(handle) = forwarder {
            let _ = handle.join();
        }

        let outcome = match solved {
            Ok(Ok(output)) => self.persist(job, &key, &model, output),
            Ok(Err(err)) => Err(err),
            Err(payload) => Err(ShiftPlanError::Solver(panic_message(payload))),
        };

        // the key is free before anyone can observe the terminal state
        self.registry.release(&key);
        self.finish(job, &key, outcome);
    }

    fn persist(
        &self,
        job: JobId,
        key: &ProblemKey,
        model: &DomainModel,
        output: SolveOutput,
    ) -> Result<JobResult> {
        let dates = model.cycle_start()..model.cycle_end();
        let (attendance, assignments) = match key.stage {
            Stage::Attendance => {
                let rows = output.schedule.attendance_rows(model);
                debug!(event = "persist_attendance", job = %job, key = %key, rows = rows.len());
                self.sink.replace_attendance(key, dates, &rows)?;
                lock(&self.retained).insert(key.clone(), rows.clone());
                (rows, Vec::new())
            }
            Stage::Assignment => {
                let rows = output.schedule.assignment_rows(model);
                debug!(event = "persist_assignments", job = %job, key = %key, rows = rows.len());
                self.sink.replace_assignments(key, dates, &rows)?;
                (Vec::new(), rows)
            }
        };
        info!(
            event = "persist_done",
            job = %job,
            key = %key,
            rows = attendance.len() + assignments.len(),
        );

        Ok(JobResult {
            job,
            key: key.clone(),
            score: output.score,
            schedule: output.schedule,
            analysis: output.analysis,
            attendance,
            assignments,
            cancelled: output.search.cancelled,
        })
    }

    fn finish(&self, job: JobId, key: &ProblemKey, outcome: Result<JobResult>) {
        let mut jobs = lock(&self.jobs);
        if let Some(record) = jobs.get_mut(&job) {
            match outcome {
                Ok(result) => {
                    info!(
                        event = "job_completed",
                        job = %job,
                        key = %key,
                        score = %result.score,
                        feasible = result.score.is_feasible(),
                        cancelled = result.cancelled,
                    );
                    let score = result.score;
                    record.result = Some(result);
                    record
                        .status
                        .send_modify(|s| *s = s.with_score(score).with_state(JobState::Completed));
                }
                Err(err) => {
                    error!(event = "job_failed", job = %job, key = %key, cause = %err);
                    record.status.send_modify(|s| *s = s.failed(err.to_string()));
                }
            }
        }
        drop(jobs);
        self.done.notify_all();
    }
}
