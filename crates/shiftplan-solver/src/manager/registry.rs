//! Registry of active jobs keyed by problem identity.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use shiftplan_core::{JobId, ProblemKey, Result, ShiftPlanError};

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    active: HashMap<ProblemKey, JobId>,
}

/// Hands out job ids and enforces one active job per [`ProblemKey`].
///
/// Only active jobs are held; releasing a key forgets its job.
///
/// # Example
///
/// ```
/// use shiftplan_core::{ProblemKey, ShiftPlanError, Stage};
/// use shiftplan_solver::JobRegistry;
///
/// let registry = JobRegistry::new();
/// let key = ProblemKey::new("S1", chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), None, Stage::Attendance);
/// let job = registry.try_register(key.clone()).unwrap();
/// assert!(matches!(registry.try_register(key.clone()), Err(ShiftPlanError::JobConflict(_))));
/// assert_eq!(registry.release(&key), Some(job));
/// assert!(registry.try_register(key).is_ok());
/// ```
#[derive(Debug, Default)]
pub struct JobRegistry {
    inner: Mutex<RegistryInner>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a job for `key` unless one is already active.
    ///
    /// # Errors
    ///
    /// `JobConflict` when `key` has an active job.
    pub fn try_register(&self, key: ProblemKey) -> Result<JobId> {
        let mut inner = self.lock();
        if inner.active.contains_key(&key) {
            return Err(ShiftPlanError::JobConflict(key));
        }
        inner.next_id += 1;
        let job = JobId(inner.next_id);
        inner.active.insert(key, job);
        Ok(job)
    }

    /// Frees `key` for the next submission. Returns the job that held it.
    pub fn release(&self, key: &ProblemKey) -> Option<JobId> {
        self.lock().active.remove(key)
    }

    pub fn active_job(&self, key: &ProblemKey) -> Option<JobId> {
        self.lock().active.get(key).copied()
    }

    pub fn is_active(&self, key: &ProblemKey) -> bool {
        self.lock().active.contains_key(key)
    }

    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }
}
