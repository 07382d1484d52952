//! HardSoftScore - hard feasibility level and soft quality level

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use super::ScoreLevel;

/// A score with separate hard and soft levels.
///
/// Scores compare lexicographically: the hard level decides, the soft level
/// only breaks ties between equal hard levels.
///
/// # Examples
///
/// ```
/// use shiftplan_core::HardSoftScore;
///
/// let infeasible = HardSoftScore::of(-1, 0);
/// let feasible = HardSoftScore::of(0, -5_000);
/// assert!(feasible > infeasible);
///
/// let parsed: HardSoftScore = "-2hard/-40soft".parse().unwrap();
/// assert_eq!(parsed, HardSoftScore::of(-2, -40));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardSoftScore {
    hard: i64,
    soft: i64,
}

impl HardSoftScore {
    pub const ZERO: HardSoftScore = HardSoftScore { hard: 0, soft: 0 };

    pub const ONE_HARD: HardSoftScore = HardSoftScore { hard: 1, soft: 0 };

    pub const ONE_SOFT: HardSoftScore = HardSoftScore { hard: 0, soft: 1 };

    #[inline]
    pub const fn of(hard: i64, soft: i64) -> Self {
        HardSoftScore { hard, soft }
    }

    #[inline]
    pub const fn of_hard(hard: i64) -> Self {
        HardSoftScore { hard, soft: 0 }
    }

    #[inline]
    pub const fn of_soft(soft: i64) -> Self {
        HardSoftScore { hard: 0, soft }
    }

    /// A penalty of `amount` on the given level.
    #[inline]
    pub const fn penalty(level: ScoreLevel, amount: i64) -> Self {
        match level {
            ScoreLevel::Hard => HardSoftScore::of_hard(-amount),
            ScoreLevel::Soft => HardSoftScore::of_soft(-amount),
        }
    }

    #[inline]
    pub const fn hard(&self) -> i64 {
        self.hard
    }

    #[inline]
    pub const fn soft(&self) -> i64 {
        self.soft
    }

    /// True when no hard penalty is present.
    #[inline]
    pub const fn is_feasible(&self) -> bool {
        self.hard >= 0
    }

    /// Collapses both levels into one number for temperature-based acceptors.
    ///
    /// One hard point outweighs a million soft points.
    pub fn to_scalar(&self) -> f64 {
        self.hard as f64 * 1_000_000.0 + self.soft as f64
    }
}

impl Ord for HardSoftScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hard
            .cmp(&other.hard)
            .then_with(|| self.soft.cmp(&other.soft))
    }
}

impl PartialOrd for HardSoftScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for HardSoftScore {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        HardSoftScore::of(self.hard + other.hard, self.soft + other.soft)
    }
}

impl AddAssign for HardSoftScore {
    fn add_assign(&mut self, other: Self) {
        self.hard += other.hard;
        self.soft += other.soft;
    }
}

impl Sub for HardSoftScore {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        HardSoftScore::of(self.hard - other.hard, self.soft - other.soft)
    }
}

impl SubAssign for HardSoftScore {
    fn sub_assign(&mut self, other: Self) {
        self.hard -= other.hard;
        self.soft -= other.soft;
    }
}

impl Neg for HardSoftScore {
    type Output = Self;

    fn neg(self) -> Self {
        HardSoftScore::of(-self.hard, -self.soft)
    }
}

impl Sum for HardSoftScore {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(HardSoftScore::ZERO, Add::add)
    }
}

impl fmt::Debug for HardSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HardSoftScore({}, {})", self.hard, self.soft)
    }
}

impl fmt::Display for HardSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}soft", self.hard, self.soft)
    }
}

/// Error when parsing a score from its `"Xhard/Ysoft"` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreParseError {
    pub message: String,
}

impl fmt::Display for ScoreParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score parse error: {}", self.message)
    }
}

impl std::error::Error for ScoreParseError {}

fn parse_level(part: &str, suffix: &str) -> Result<i64, ScoreParseError> {
    let part = part.trim();
    let digits = part.strip_suffix(suffix).ok_or_else(|| ScoreParseError {
        message: format!("'{}' must end with '{}'", part, suffix),
    })?;
    digits.parse::<i64>().map_err(|e| ScoreParseError {
        message: format!("invalid {} level '{}': {}", suffix, digits, e),
    })
}

impl FromStr for HardSoftScore {
    type Err = ScoreParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (hard, soft) = s.split_once('/').ok_or_else(|| ScoreParseError {
            message: format!("'{}' is not of the form '<n>hard/<n>soft'", s),
        })?;
        Ok(HardSoftScore::of(
            parse_level(hard, "hard")?,
            parse_level(soft, "soft")?,
        ))
    }
}
