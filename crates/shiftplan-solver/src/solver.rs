//! One solve, end to end, on the calling thread.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shiftplan_config::SolverConfig;
use shiftplan_core::{DomainModel, HardSoftScore, Result, Schedule};
use shiftplan_scoring::{IncrementalDirector, RuleSet, ScoreAnalysis};
use tokio::sync::mpsc;
use tracing::info;

use crate::construction::{self, ConstructionSummary};
use crate::eligibility::EligibilityEngine;
use crate::localsearch::{BestSolutionEvent, LocalSearch, SearchOutcome};
use crate::units::build_units;

/// Everything a finished solve hands back.
#[derive(Debug, Clone)]
pub struct SolveOutput {
    /// Best schedule found, carrying its score.
    pub schedule: Schedule,
    pub score: HardSoftScore,
    pub analysis: ScoreAnalysis,
    pub construction: ConstructionSummary,
    pub search: SearchOutcome,
}

/// Runs units → eligibility → construction → local search for one model.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::AtomicBool;
/// use shiftplan_config::SolverConfig;
/// use shiftplan_core::{DomainModel, ProblemKey, ProblemSnapshot, Stage};
/// use shiftplan_solver::ShiftSolver;
///
/// let key = ProblemKey::new("S1", chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), None, Stage::Attendance);
/// let model = Arc::new(DomainModel::build(ProblemSnapshot::new(key)).unwrap());
/// let solver = ShiftSolver::new(SolverConfig::new().with_move_count_limit(10).with_random_seed(1));
/// let output = solver.solve(model, Arc::new(AtomicBool::new(false))).unwrap();
/// assert!(output.score.is_feasible());
/// ```
#[derive(Debug, Clone)]
pub struct ShiftSolver {
    config: SolverConfig,
    sender: Option<mpsc::UnboundedSender<BestSolutionEvent>>,
}

impl ShiftSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            sender: None,
        }
    }

    /// Announces every new best schedule of the search on `sender`.
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<BestSolutionEvent>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Prepares the director: generated units with their candidate sets.
    pub fn prepare(&self, model: Arc<DomainModel>) -> Result<IncrementalDirector> {
        let stage = model.stage();
        let mut units = build_units(&model, &self.config);
        EligibilityEngine::new(&model, &self.config.eligibility).annotate(stage, &mut units)?;
        let rules = RuleSet::for_stage(stage, &self.config);
        Ok(IncrementalDirector::new(
            model,
            Schedule::new(stage, units),
            rules,
        ))
    }

    /// Solves `model` until a termination fires or `cancel` is set.
    pub fn solve(&self, model: Arc<DomainModel>, cancel: Arc<AtomicBool>) -> Result<SolveOutput> {
        let started = Instant::now();
        let stage = model.stage();
        let key = model.key().clone();
        let mut rng = match self.config.random_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let mut director = self.prepare(model)?;
        info!(
            event = "solve_start",
            key = %key,
            stage = %stage,
            units = director.units().len(),
            employees = director.model().employees().len(),
            terms = director.term_count(),
        );

        let construction = construction::construct(stage, &self.config, &mut director, &mut rng)?;

        let acceptor_seed = rng.random::<u64>();
        let mut search = LocalSearch::from_config(&self.config, cancel, acceptor_seed)?;
        if let Some(sender) = &self.sender {
            search = search.with_progress(sender.clone());
        }
        let outcome = search.run(&mut director, &mut rng)?;

        // rescore the best schedule for its breakdown
        let best = IncrementalDirector::new(
            Arc::clone(director.shared_model()),
            outcome.best.clone(),
            RuleSet::for_stage(stage, &self.config),
        );
        let analysis = best.analyze();
        let schedule = best.into_schedule();
        let score = outcome.score;

        info!(
            event = "solve_end",
            key = %key,
            score = %score,
            feasible = score.is_feasible(),
            duration_ms = started.elapsed().as_millis() as u64,
            moves_evaluated = outcome.moves,
            moves_accepted = outcome.accepted,
            cancelled = outcome.cancelled,
        );
        Ok(SolveOutput {
            schedule,
            score,
            analysis,
            construction,
            search: outcome,
        })
    }
}
