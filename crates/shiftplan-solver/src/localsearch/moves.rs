//! Moves over assignable units and their random selection.

use std::fmt;

use rand::Rng;
use shiftplan_config::MoveConfig;
use shiftplan_core::{AssignableUnit, EmployeeId, Result, UnitId};
use shiftplan_scoring::IncrementalDirector;
use smallvec::SmallVec;

/// A change to the working schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMove {
    /// Give `unit` to `to`, or empty it.
    Change {
        unit: UnitId,
        to: Option<EmployeeId>,
    },
    /// Exchange the holders of two units.
    Swap { left: UnitId, right: UnitId },
}

impl fmt::Display for ScheduleMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleMove::Change { unit, to: Some(e) } => write!(f, "{} <- {}", unit, e),
            ScheduleMove::Change { unit, to: None } => write!(f, "{} <- none", unit),
            ScheduleMove::Swap { left, right } => write!(f, "{} <-> {}", left, right),
        }
    }
}

/// Previous holders of the units a move touched, oldest change first.
#[derive(Debug, Default)]
pub struct MoveUndo {
    previous: SmallVec<[(UnitId, Option<EmployeeId>); 2]>,
}

impl MoveUndo {
    /// Restores every touched unit, newest change first.
    pub fn revert(self, director: &mut IncrementalDirector) -> Result<()> {
        for (unit, value) in self.previous.into_iter().rev() {
            director.begin_change(unit).commit(value)?;
        }
        Ok(())
    }
}

impl ScheduleMove {
    /// True when the move changes something, every target accepts its new
    /// value and no new holder ends up with two overlapping units on one
    /// date.
    pub fn is_doable(&self, director: &IncrementalDirector) -> bool {
        let units = director.units();
        let view = director.view();
        let free_for = |unit: &AssignableUnit, holder: Option<EmployeeId>, except: &[UnitId]| {
            holder.map_or(true, |e| {
                !view.holds_overlapping(e, unit.date(), &unit.window(), except)
            })
        };
        match *self {
            ScheduleMove::Change { unit, to } => units.get(unit.index()).is_some_and(|u| {
                !u.pinned && u.assigned != to && u.accepts(to) && free_for(u, to, &[unit])
            }),
            ScheduleMove::Swap { left, right } => {
                let (Some(l), Some(r)) = (units.get(left.index()), units.get(right.index()))
                else {
                    return false;
                };
                left != right
                    && !l.pinned
                    && !r.pinned
                    && l.assigned != r.assigned
                    && l.accepts(r.assigned)
                    && r.accepts(l.assigned)
                    && free_for(l, r.assigned, &[left, right])
                    && free_for(r, l.assigned, &[left, right])
            }
        }
    }

    /// Applies the move through change transactions.
    ///
    /// On error every change already made is rolled back.
    pub fn do_move(&self, director: &mut IncrementalDirector) -> Result<MoveUndo> {
        let mut undo = MoveUndo::default();
        let steps: SmallVec<[(UnitId, Option<EmployeeId>); 2]> = match *self {
            ScheduleMove::Change { unit, to } => smallvec::smallvec![(unit, to)],
            ScheduleMove::Swap { left, right } => {
                let l = director.unit(left).assigned;
                let r = director.unit(right).assigned;
                smallvec::smallvec![(left, r), (right, l)]
            }
        };
        for (unit, value) in steps {
            let guard = director.begin_change(unit);
            let previous = guard.current();
            if let Err(err) = guard.commit(value) {
                undo.revert(director)?;
                return Err(err);
            }
            undo.previous.push((unit, previous));
        }
        Ok(undo)
    }
}

/// Draws random moves over the units search may touch.
///
/// Pinned units and units that can never change are left out once, when
/// the selector is built.
#[derive(Debug, Clone)]
pub struct MoveSelector {
    movable: Vec<UnitId>,
    config: MoveConfig,
}

/// Random picks spent looking for an empty unit before falling back.
const UNDERFILLED_PROBES: usize = 16;
/// Draws spent looking for a doable move before giving up for this step.
const MAX_ATTEMPTS: usize = 64;

impl MoveSelector {
    pub fn new(director: &IncrementalDirector, config: MoveConfig) -> Self {
        let movable = director
            .units()
            .iter()
            .filter(|u| !u.pinned && (!u.candidates.is_empty() || u.assigned.is_some()))
            .map(|u| u.id)
            .collect();
        Self { movable, config }
    }

    /// Units in the move domain.
    pub fn movable(&self) -> &[UnitId] {
        &self.movable
    }

    pub fn is_empty(&self) -> bool {
        self.movable.is_empty()
    }

    /// Draws a doable move, or `None` when none was found.
    pub fn next_move<R: Rng>(
        &self,
        director: &IncrementalDirector,
        rng: &mut R,
    ) -> Option<ScheduleMove> {
        if self.movable.is_empty() {
            return None;
        }
        for _ in 0..MAX_ATTEMPTS {
            let candidate = if self.movable.len() > 1 && rng.random_bool(self.config.swap_probability)
            {
                let left = self.pick_any(rng);
                let right = self.pick_any(rng);
                ScheduleMove::Swap { left, right }
            } else {
                let unit = self.pick_unit(director, rng);
                ScheduleMove::Change {
                    unit,
                    to: self.pick_value(director, unit, rng),
                }
            };
            if candidate.is_doable(director) {
                return Some(candidate);
            }
        }
        None
    }

    fn pick_any<R: Rng>(&self, rng: &mut R) -> UnitId {
        self.movable[rng.random_range(0..self.movable.len())]
    }

    /// A random unit, biased toward empty ones.
    fn pick_unit<R: Rng>(&self, director: &IncrementalDirector, rng: &mut R) -> UnitId {
        if rng.random_bool(self.config.underfilled_bias) {
            for _ in 0..UNDERFILLED_PROBES {
                let unit = self.pick_any(rng);
                if director.unit(unit).assigned.is_none() {
                    return unit;
                }
            }
        }
        self.pick_any(rng)
    }

    fn pick_value<R: Rng>(
        &self,
        director: &IncrementalDirector,
        unit: UnitId,
        rng: &mut R,
    ) -> Option<EmployeeId> {
        let u = director.unit(unit);
        if u.candidates.is_empty()
            || (u.assigned.is_some() && rng.random_bool(self.config.unassign_probability))
        {
            return None;
        }
        Some(u.candidates[rng.random_range(0..u.candidates.len())])
    }
}
