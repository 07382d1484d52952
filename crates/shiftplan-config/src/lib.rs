//! Configuration system for the shiftplan optimizer.
//!
//! Load solver configuration from TOML or YAML files to control
//! termination, the search acceptor, move selection and penalty weights
//! without code changes.
//!
//! # Examples
//!
//! ```
//! use shiftplan_config::SolverConfig;
//! use std::time::Duration;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     random_seed = 7
//!
//!     [termination]
//!     seconds_spent_limit = 10
//!     unimproved_move_count_limit = 5000
//!
//!     [acceptor]
//!     type = "late_acceptance"
//!     late_acceptance_size = 200
//!
//!     [scoring]
//!     balance_weight = 300
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(10)));
//! assert_eq!(config.scoring.balance_weight, 300);
//! assert_eq!(config.scoring.overstaff_weight, 10);
//! ```
//!
//! Use the defaults when the file is missing:
//!
//! ```
//! use shiftplan_config::SolverConfig;
//!
//! let config = SolverConfig::load("shiftplan.toml").unwrap_or_default();
//! assert_eq!(config.eligibility.max_consecutive_days, 6);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shiftplan_core::HardSoftScore;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverConfig {
    /// Seeds every random generator of a job. Absent means entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,

    #[serde(default)]
    pub termination: TerminationConfig,

    #[serde(default)]
    pub acceptor: AcceptorConfig,

    #[serde(default)]
    pub moves: MoveConfig,

    #[serde(default)]
    pub eligibility: EligibilityConfig,

    #[serde(default)]
    pub construction: ConstructionConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl SolverConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file, choosing the format by extension.
    ///
    /// `.yaml` and `.yml` are read as YAML, anything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist or fails to parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses and validates configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the wall-clock limit, clearing any millisecond limit.
    pub fn with_termination_seconds(mut self, seconds: u64) -> Self {
        self.termination.seconds_spent_limit = Some(seconds);
        self.termination.millis_spent_limit = None;
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the move count limit.
    pub fn with_move_count_limit(mut self, moves: u64) -> Self {
        self.termination.move_count_limit = Some(moves);
        self
    }

    pub fn with_acceptor(mut self, acceptor: AcceptorConfig) -> Self {
        self.acceptor = acceptor;
        self
    }

    /// Checks ranges the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.termination.validate()?;
        self.acceptor.validate()?;
        self.moves.validate()?;
        if !(0.0..=1.0).contains(&self.construction.attend_probability) {
            return Err(ConfigError::Invalid(format!(
                "construction.attend_probability {} is outside 0..=1",
                self.construction.attend_probability
            )));
        }
        if self.construction.block_max_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "construction.block_max_minutes must be positive".into(),
            ));
        }
        if self.construction.slot_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "construction.slot_minutes must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Returns the wall-clock limit, if configured.
    ///
    /// ```
    /// use shiftplan_config::SolverConfig;
    /// use std::time::Duration;
    ///
    /// let config = SolverConfig::new().with_termination_seconds(3);
    /// assert_eq!(config.time_limit(), Some(Duration::from_secs(3)));
    /// ```
    pub fn time_limit(&self) -> Option<Duration> {
        self.termination.time_limit()
    }
}

/// Termination configuration.
///
/// Every configured limit ends the search; the first one reached wins.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TerminationConfig {
    /// Maximum seconds to spend solving.
    pub seconds_spent_limit: Option<u64>,

    /// Extra milliseconds on top of `seconds_spent_limit`.
    pub millis_spent_limit: Option<u64>,

    /// Maximum evaluated moves.
    pub move_count_limit: Option<u64>,

    /// Maximum moves without a new best score.
    pub unimproved_move_count_limit: Option<u64>,

    /// Maximum seconds without a new best score.
    pub unimproved_seconds_spent_limit: Option<u64>,

    /// Target best score, e.g. "0hard/-100soft".
    pub best_score_limit: Option<String>,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            seconds_spent_limit: Some(30),
            millis_spent_limit: None,
            move_count_limit: None,
            unimproved_move_count_limit: None,
            unimproved_seconds_spent_limit: None,
            best_score_limit: None,
        }
    }
}

impl TerminationConfig {
    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        let millis = self.seconds_spent_limit.unwrap_or(0) * 1000
            + self.millis_spent_limit.unwrap_or(0);
        if millis > 0 {
            Some(Duration::from_millis(millis))
        } else {
            None
        }
    }

    /// Returns the unimproved time limit as a Duration, if any.
    pub fn unimproved_time_limit(&self) -> Option<Duration> {
        self.unimproved_seconds_spent_limit.map(Duration::from_secs)
    }

    /// Parses `best_score_limit`.
    pub fn best_score(&self) -> Result<Option<HardSoftScore>, ConfigError> {
        self.best_score_limit
            .as_deref()
            .map(|s| {
                s.parse::<HardSoftScore>().map_err(|e| {
                    ConfigError::Invalid(format!("termination.best_score_limit: {}", e))
                })
            })
            .transpose()
    }

    /// True when at least one limit is set.
    pub fn is_bounded(&self) -> bool {
        self.time_limit().is_some()
            || self.move_count_limit.is_some()
            || self.unimproved_move_count_limit.is_some()
            || self.unimproved_seconds_spent_limit.is_some()
            || self.best_score_limit.is_some()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.best_score()?;
        if !self.is_bounded() {
            return Err(ConfigError::Invalid(
                "termination needs at least one limit".into(),
            ));
        }
        Ok(())
    }
}

/// Acceptor configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AcceptorConfig {
    /// Only accept moves that do not worsen the score.
    HillClimbing,

    /// Late acceptance acceptor.
    LateAcceptance(LateAcceptanceConfig),

    /// Simulated annealing acceptor.
    SimulatedAnnealing(SimulatedAnnealingConfig),
}

impl Default for AcceptorConfig {
    fn default() -> Self {
        AcceptorConfig::LateAcceptance(LateAcceptanceConfig::default())
    }
}

impl AcceptorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            AcceptorConfig::HillClimbing => Ok(()),
            AcceptorConfig::LateAcceptance(c) if c.late_acceptance_size == 0 => Err(
                ConfigError::Invalid("late_acceptance_size must be positive".into()),
            ),
            AcceptorConfig::LateAcceptance(_) => Ok(()),
            AcceptorConfig::SimulatedAnnealing(c) => {
                if c.starting_temperature <= 0.0 {
                    return Err(ConfigError::Invalid(
                        "starting_temperature must be positive".into(),
                    ));
                }
                if !(c.decay_rate > 0.0 && c.decay_rate <= 1.0) {
                    return Err(ConfigError::Invalid(format!(
                        "decay_rate {} is outside (0, 1]",
                        c.decay_rate
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Late acceptance configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LateAcceptanceConfig {
    /// Size of the late acceptance history.
    pub late_acceptance_size: usize,
}

impl Default for LateAcceptanceConfig {
    fn default() -> Self {
        Self {
            late_acceptance_size: 400,
        }
    }
}

/// Simulated annealing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SimulatedAnnealingConfig {
    pub starting_temperature: f64,

    /// Multiplier applied to the temperature after every step.
    pub decay_rate: f64,
}

impl Default for SimulatedAnnealingConfig {
    fn default() -> Self {
        Self {
            starting_temperature: 2.0,
            decay_rate: 0.9995,
        }
    }
}

/// Move selection configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MoveConfig {
    /// Chance of a swap move instead of a change move.
    pub swap_probability: f64,

    /// Chance a change move clears the unit.
    pub unassign_probability: f64,

    /// Chance the selector starts from an unassigned unit.
    pub underfilled_bias: f64,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            swap_probability: 0.2,
            unassign_probability: 0.05,
            underfilled_bias: 0.5,
        }
    }
}

impl MoveConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, p) in [
            ("swap_probability", self.swap_probability),
            ("unassign_probability", self.unassign_probability),
            ("underfilled_bias", self.underfilled_bias),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "moves.{} {} is outside 0..=1",
                    name, p
                )));
            }
        }
        Ok(())
    }
}

/// Eligibility thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EligibilityConfig {
    /// Consecutive attendance days after which the next day is refused.
    pub max_consecutive_days: u32,

    pub min_skill_level: u8,

    pub min_pattern_priority: u8,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            max_consecutive_days: 6,
            min_skill_level: 2,
            min_pattern_priority: 2,
        }
    }
}

/// Initial construction settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ConstructionConfig {
    /// Chance an eligible employee attends a given free date.
    pub attend_probability: f64,

    /// Longest assignment block when a resource sets no allowance.
    pub block_max_minutes: i64,

    /// Demand slot length used when a snapshot does not set one.
    pub slot_minutes: i64,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            attend_probability: 0.7,
            block_max_minutes: 60,
            slot_minutes: 15,
        }
    }
}

/// Penalty weights and scoring switches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScoringConfig {
    /// Treat attendance units as mandatory seats.
    pub attendance_units_mandatory: bool,

    /// Daily minutes cap when the employee sets none.
    pub default_max_daily_minutes: i64,

    /// Top of the pattern priority scale.
    pub max_priority: u8,

    pub balance_weight: i64,
    pub overstaff_weight: i64,
    pub uncovered_weight: i64,
    pub workload_weight: i64,
    pub fragmentation_weight: i64,
    /// Gap in minutes that splits a day into separate blocks.
    pub fragmentation_gap_minutes: i64,
    pub break_weight: i64,
    /// Worked minutes from which a break is expected.
    pub break_threshold_minutes: i64,
    pub break_minutes: i64,
    pub work_day_weight: i64,
    pub handoff_weight: i64,
    /// Per employee working a date, ASSIGNMENT only.
    pub daily_workers_weight: i64,
    pub pattern_weight: i64,
    pub shortfall_weight: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            attendance_units_mandatory: false,
            default_max_daily_minutes: 480,
            max_priority: 4,
            balance_weight: 200,
            overstaff_weight: 10,
            uncovered_weight: 120,
            workload_weight: 5,
            fragmentation_weight: 1,
            fragmentation_gap_minutes: 15,
            break_weight: 50,
            break_threshold_minutes: 360,
            break_minutes: 60,
            work_day_weight: 100,
            handoff_weight: 2,
            daily_workers_weight: 10,
            pattern_weight: 10,
            shortfall_weight: 5,
        }
    }
}
