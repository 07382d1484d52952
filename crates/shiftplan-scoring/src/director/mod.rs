//! Incremental score director.
//!
//! [`IncrementalDirector`] owns the working schedule. Every mutation goes
//! through a [`ChangeGuard`], which rescores only the terms the changed
//! unit feeds.

mod analysis;


use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::debug;

use shiftplan_core::{
    AssignableUnit, DomainModel, EmployeeId, HardSoftScore, Result, Schedule, ScoreLevel,
    ShiftPlanError, UnitId,
};

use crate::rules::RuleSet;
use crate::term::TermKey;
use crate::view::{LiveIndex, ScoreView, StaticIndex};

pub use analysis::{ConstraintAnalysis, ScoreAnalysis};

type TermIds = SmallVec<[u32; 8]>;

#[derive(Debug)]
struct Term {
    rule: usize,
    key: TermKey,
    amount: i64,
}

/// Terms of one unit: those fed whoever holds it, and those of each
/// candidate, aligned with `AssignableUnit::candidates`.
#[derive(Debug, Default)]
struct UnitTerms {
    fixed: TermIds,
    by_candidate: Vec<TermIds>,
}

/// Owns a schedule and keeps its score current under single-unit changes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use shiftplan_config::SolverConfig;
/// use shiftplan_core::{DomainModel, EmployeeId, HardSoftScore, ProblemKey, ProblemSnapshot, Schedule, Stage};
/// use shiftplan_scoring::{IncrementalDirector, RuleSet};
///
/// let key = ProblemKey::new("S1", chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), None, Stage::Attendance);
/// let model = Arc::new(DomainModel::build(ProblemSnapshot::new(key)).unwrap());
/// let rules = RuleSet::for_stage(Stage::Attendance, &SolverConfig::default());
/// let director = IncrementalDirector::new(model, Schedule::new(Stage::Attendance, vec![]), rules);
/// assert_eq!(director.score(), HardSoftScore::ZERO);
/// ```
#[derive(Debug)]
pub struct IncrementalDirector {
    model: Arc<DomainModel>,
    rules: RuleSet,
    levels: Vec<ScoreLevel>,
    schedule: Schedule,
    statics: StaticIndex,
    live: LiveIndex,
    terms: Vec<Term>,
    lookup: HashMap<(usize, TermKey), u32>,
    unit_terms: Vec<UnitTerms>,
    score: HardSoftScore,
    change_count: u64,
}

impl IncrementalDirector {
    /// Indexes every term the schedule can reach and scores it once.
    pub fn new(model: Arc<DomainModel>, schedule: Schedule, rules: RuleSet) -> Self {
        let statics = StaticIndex::build(&model, schedule.stage, &schedule.units);
        let live = LiveIndex::from_units(&schedule.units, model.employees().len());
        let levels = rules.iter().map(|r| r.level()).collect();
        let mut director = Self {
            model,
            rules,
            levels,
            schedule,
            statics,
            live,
            terms: Vec::new(),
            lookup: HashMap::new(),
            unit_terms: Vec::new(),
            score: HardSoftScore::ZERO,
            change_count: 0,
        };
        director.register_terms();
        director.score = director.rescore_all();
        debug!(
            event = "director_built",
            stage = %director.schedule.stage,
            units = director.schedule.len(),
            terms = director.terms.len(),
            score = %director.score,
        );
        director
    }

    fn register_terms(&mut self) {
        let mut global = Vec::new();
        let mut per_unit = Vec::with_capacity(self.schedule.len());
        {
            let view = self.view();
            let mut scratch = Vec::new();
            for (idx, rule) in self.rules.iter().enumerate() {
                scratch.clear();
                rule.global_terms(&view, &mut scratch);
                global.extend(scratch.drain(..).map(|k| (idx, k)));
            }
            for unit in &self.schedule.units {
                let fixed = collect_keys(&self.rules, &view, unit, None);
                let by_candidate: Vec<_> = unit
                    .candidates
                    .iter()
                    .map(|e| collect_keys(&self.rules, &view, unit, Some(*e)))
                    .collect();
                if let Some(e) = unit.assigned.filter(|e| unit.candidates.binary_search(e).is_err()) {
                    global.extend(collect_keys(&self.rules, &view, unit, Some(e)));
                }
                per_unit.push((fixed, by_candidate));
            }
        }

        for (rule, key) in global {
            self.intern(rule, key);
        }
        let unit_terms: Vec<UnitTerms> = per_unit
            .into_iter()
            .map(|(fixed, by_candidate)| UnitTerms {
                fixed: self.intern_all(fixed),
                by_candidate: by_candidate
                    .into_iter()
                    .map(|keys| self.intern_all(keys))
                    .collect(),
            })
            .collect();
        self.unit_terms = unit_terms;
    }

    fn intern(&mut self, rule: usize, key: TermKey) -> u32 {
        if let Some(id) = self.lookup.get(&(rule, key.clone())) {
            return *id;
        }
        let id = self.terms.len() as u32;
        self.terms.push(Term {
            rule,
            key: key.clone(),
            amount: 0,
        });
        self.lookup.insert((rule, key), id);
        id
    }

    fn intern_all(&mut self, keys: Vec<(usize, TermKey)>) -> TermIds {
        let mut ids: TermIds = keys.into_iter().map(|(r, k)| self.intern(r, k)).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Term ids of `unit` while held by `employee`.
    fn employee_terms(&mut self, unit: UnitId, employee: EmployeeId) -> TermIds {
        let u = &self.schedule.units[unit.index()];
        if let Ok(pos) = u.candidates.binary_search(&employee) {
            return self.unit_terms[unit.index()].by_candidate[pos].clone();
        }
        // a holder outside the candidate set, e.g. from a hand-built schedule
        let keys = collect_keys(&self.rules, &self.view(), u, Some(employee));
        self.intern_all(keys)
    }

    fn rescore_all(&mut self) -> HardSoftScore {
        let mut total = HardSoftScore::ZERO;
        let view = ScoreView {
            model: &self.model,
            units: &self.schedule.units,
            statics: &self.statics,
            live: &self.live,
        };
        for term in &mut self.terms {
            term.amount = self.rules.get(term.rule).evaluate(&term.key, &view);
            total += HardSoftScore::penalty(self.levels[term.rule], term.amount);
        }
        total
    }

    pub fn model(&self) -> &DomainModel {
        &self.model
    }

    pub fn shared_model(&self) -> &Arc<DomainModel> {
        &self.model
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn units(&self) -> &[AssignableUnit] {
        &self.schedule.units
    }

    pub fn unit(&self, id: UnitId) -> &AssignableUnit {
        self.schedule.unit(id)
    }

    /// Current score of the working schedule.
    pub fn score(&self) -> HardSoftScore {
        self.score
    }

    /// Number of committed changes since construction.
    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn view(&self) -> ScoreView<'_> {
        ScoreView {
            model: &self.model,
            units: &self.schedule.units,
            statics: &self.statics,
            live: &self.live,
        }
    }

    /// Opens a change of one unit. Dropping the guard without committing
    /// leaves the schedule untouched.
    pub fn begin_change(&mut self, unit: UnitId) -> ChangeGuard<'_> {
        ChangeGuard {
            director: self,
            unit,
        }
    }

    /// Excludes a unit from further changes for the lifetime of the director.
    pub fn pin(&mut self, unit: UnitId) -> Result<()> {
        let u = self
            .schedule
            .units
            .get_mut(unit.index())
            .ok_or_else(|| ShiftPlanError::InvalidState(format!("unknown unit {}", unit)))?;
        u.pinned = true;
        Ok(())
    }

    fn apply(&mut self, unit: UnitId, value: Option<EmployeeId>) -> Result<HardSoftScore> {
        let u = self
            .schedule
            .units
            .get(unit.index())
            .ok_or_else(|| ShiftPlanError::InvalidState(format!("unknown unit {}", unit)))?;
        if u.pinned {
            return Err(ShiftPlanError::PinnedUnit(unit));
        }
        if let Some(e) = value {
            if !u.accepts(value) {
                return Err(ShiftPlanError::NotACandidate { unit, employee: e });
            }
        }
        let old = u.assigned;
        if old == value {
            return Ok(self.score);
        }
        let date = u.date();

        let mut affected: TermIds = self.unit_terms[unit.index()].fixed.clone();
        if let Some(e) = old {
            affected.extend(self.employee_terms(unit, e));
        }
        if let Some(e) = value {
            affected.extend(self.employee_terms(unit, e));
        }
        affected.sort_unstable();
        affected.dedup();

        for id in &affected {
            let term = &self.terms[*id as usize];
            self.score -= HardSoftScore::penalty(self.levels[term.rule], term.amount);
        }

        if let Some(e) = old {
            self.live.remove(e, date, unit);
        }
        self.schedule.units[unit.index()].assigned = value;
        if let Some(e) = value {
            self.live.insert(e, date, unit);
        }

        let view = ScoreView {
            model: &self.model,
            units: &self.schedule.units,
            statics: &self.statics,
            live: &self.live,
        };
        for id in &affected {
            let term = &mut self.terms[*id as usize];
            term.amount = self.rules.get(term.rule).evaluate(&term.key, &view);
            self.score += HardSoftScore::penalty(self.levels[term.rule], term.amount);
        }
        self.change_count += 1;
        Ok(self.score)
    }

    /// Scores the working schedule from scratch, ignoring every cache.
    pub fn calculate_full(&self) -> HardSoftScore {
        let live = LiveIndex::from_units(&self.schedule.units, self.model.employees().len());
        let view = ScoreView {
            model: &self.model,
            units: &self.schedule.units,
            statics: &self.statics,
            live: &live,
        };
        let mut keys: HashSet<(usize, TermKey)> = HashSet::new();
        let mut scratch = Vec::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            scratch.clear();
            rule.global_terms(&view, &mut scratch);
            for unit in &self.schedule.units {
                rule.unit_terms(&view, unit, None, &mut scratch);
                if let Some(e) = unit.assigned {
                    rule.unit_terms(&view, unit, Some(e), &mut scratch);
                }
            }
            keys.extend(scratch.drain(..).map(|k| (idx, k)));
        }
        keys.iter()
            .map(|(rule, key)| {
                let amount = self.rules.get(*rule).evaluate(key, &view);
                HardSoftScore::penalty(self.levels[*rule], amount)
            })
            .sum()
    }

    /// Per-rule breakdown of the current score.
    pub fn analyze(&self) -> ScoreAnalysis {
        let mut constraints: Vec<ConstraintAnalysis> = self
            .rules
            .iter()
            .map(|r| ConstraintAnalysis {
                name: r.name().to_string(),
                level: r.level(),
                score: HardSoftScore::ZERO,
                match_count: 0,
            })
            .collect();
        for term in self.terms.iter().filter(|t| t.amount != 0) {
            let entry = &mut constraints[term.rule];
            entry.score += HardSoftScore::penalty(entry.level, term.amount);
            entry.match_count += 1;
        }
        ScoreAnalysis {
            score: self.score,
            constraints,
        }
    }

    /// Copy of the working schedule carrying the current score.
    pub fn snapshot(&self) -> Schedule {
        let mut schedule = self.schedule.clone();
        schedule.score = Some(self.score);
        schedule
    }

    pub fn into_schedule(self) -> Schedule {
        let mut schedule = self.schedule;
        schedule.score = Some(self.score);
        schedule
    }
}

fn collect_keys(
    rules: &RuleSet,
    view: &ScoreView<'_>,
    unit: &AssignableUnit,
    employee: Option<EmployeeId>,
) -> Vec<(usize, TermKey)> {
    let mut keys = Vec::new();
    let mut scratch = Vec::new();
    for (idx, rule) in rules.iter().enumerate() {
        scratch.clear();
        rule.unit_terms(view, unit, employee, &mut scratch);
        keys.extend(scratch.drain(..).map(|k| (idx, k)));
    }
    keys
}

/// A pending change of one unit's holder.
///
/// Holds the director mutably, so no other change or score read can
/// interleave. Only [`commit`](ChangeGuard::commit) mutates.
#[must_use = "a change guard does nothing until committed"]
pub struct ChangeGuard<'a> {
    director: &'a mut IncrementalDirector,
    unit: UnitId,
}

impl ChangeGuard<'_> {
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Current holder of the unit, before the change.
    pub fn current(&self) -> Option<EmployeeId> {
        self.director
            .schedule
            .units
            .get(self.unit.index())
            .and_then(|u| u.assigned)
    }

    /// Assigns `value` and returns the new total score.
    ///
    /// # Errors
    ///
    /// `PinnedUnit` for a pinned unit, `NotACandidate` when `value` is not in
    /// the unit's candidate set. The schedule is unchanged on error.
    pub fn commit(self, value: Option<EmployeeId>) -> Result<HardSoftScore> {
        self.director.apply(self.unit, value)
    }
}
