//! Time windows and calendar helpers.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

/// A half-open time-of-day range `[start, end)` within one date.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// A window of `minutes` starting at `start`, clamped to the end of day.
    pub fn starting_at(start: NaiveTime, minutes: i64) -> Self {
        let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(minutes));
        let end = if wrapped != 0 {
            NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(start)
        } else {
            end
        };
        Self { start, end }
    }

    /// True when `start < end`.
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies fully inside this window.
    pub fn contains(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn contains_time(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }
}

impl fmt::Debug for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// `(year, month)` of a date.
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// True when the Monday-to-Sunday week starting at `monday` spans two months.
pub fn week_crosses_month(monday: NaiveDate) -> bool {
    month_key(monday) != month_key(monday + Duration::days(6))
}

/// Dates of `[start, end)`.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d < end)
}

/// First day of the month after `date`'s month.
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(date)
}
