//! Date and time shorthands. Invalid inputs panic.

use chrono::{NaiveDate, NaiveTime};
use shiftplan_core::TimeWindow;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

/// `[sh:sm, eh:em)`
pub fn window(sh: u32, sm: u32, eh: u32, em: u32) -> TimeWindow {
    TimeWindow::new(time(sh, sm), time(eh, em))
}
