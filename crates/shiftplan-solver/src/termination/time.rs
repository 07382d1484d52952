//! Wall-clock terminations.

use std::time::Duration;

use super::Termination;
use crate::scope::SearchScope;

/// Stops once the search has run for `limit`.
///
/// ```
/// use std::time::Duration;
/// use shiftplan_solver::termination::TimeTermination;
///
/// let term = TimeTermination::seconds(30);
/// assert_eq!(term.limit(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct TimeTermination {
    limit: Duration,
}

impl TimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl Termination for TimeTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.elapsed() >= self.limit
    }
}

/// Stops when the best score has not improved for `limit`.
#[derive(Debug, Clone)]
pub struct UnimprovedTimeTermination {
    limit: Duration,
}

impl UnimprovedTimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl Termination for UnimprovedTimeTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.time_since_improvement() >= self.limit
    }
}
