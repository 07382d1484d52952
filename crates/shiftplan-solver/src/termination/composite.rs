//! Composite terminations.

use super::Termination;
use crate::scope::SearchScope;

/// Stops when any of its parts would stop.
///
/// An empty composite never stops.
#[derive(Debug, Default)]
pub struct OrTermination {
    parts: Vec<Box<dyn Termination>>,
}

impl OrTermination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, part: impl Termination + 'static) -> Self {
        self.parts.push(Box::new(part));
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Termination for OrTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        self.parts.iter().any(|t| t.is_terminated(scope))
    }
}
