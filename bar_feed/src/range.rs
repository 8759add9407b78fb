//! Date range resolution for user-supplied fetch windows.
//!
//! Custom runs accept each endpoint either as an absolute `YYYY-MM-DD` date
//! or as a partial `MM-DD` that omits the year. [`resolve`] turns one such
//! pair plus a reference "today" into an ordered absolute [`DateRange`]:
//!
//! - explicit years are used as given;
//! - a month-day first takes the reference date's year;
//! - when both endpoints omitted the year and the assembled start lands
//!   after the end, the start's year is decremented by one (a Dec→Jan window
//!   entered in early January means *last* December);
//! - anything still reversed is rejected, never guessed.
//!
//! Resolution is a pure function of its inputs, so every year-inference rule
//! is unit-testable without touching the system clock.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::tz::{TzError, from_local_naive};

/// Errors produced while resolving a fetch window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The resolved start date lies after the resolved end date.
    #[error("start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The resolved end date lies in the future; bars for it cannot exist yet.
    #[error("end {end} is after the reference date {today}")]
    FutureRange { end: NaiveDate, today: NaiveDate },

    /// A month-day does not exist in the year it was assigned
    /// (e.g. `02-29` resolved against a non-leap year).
    #[error("no such calendar date: {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    /// The endpoint string is neither `MM-DD` nor `YYYY-MM-DD`.
    #[error("invalid date spec: {input} (expected MM-DD or YYYY-MM-DD)")]
    BadSpec { input: String },
}

/// One endpoint of a requested window: absolute, or month-day with the year
/// left for [`resolve`] to infer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    /// `MM-DD`, year inferred from the reference date.
    MonthDay { month: u32, day: u32 },
    /// `YYYY-MM-DD`, used as given.
    Absolute(NaiveDate),
}

impl DateSpec {
    fn is_partial(&self) -> bool {
        matches!(self, DateSpec::MonthDay { .. })
    }

    /// Pin this spec to a concrete year. Absolute specs keep their own year.
    fn with_year(&self, year: i32) -> Result<NaiveDate, RangeError> {
        match *self {
            DateSpec::Absolute(date) => Ok(date),
            DateSpec::MonthDay { month, day } => NaiveDate::from_ymd_opt(year, month, day)
                .ok_or(RangeError::InvalidDate { year, month, day }),
        }
    }
}

impl FromStr for DateSpec {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || RangeError::BadSpec {
            input: s.to_string(),
        };
        let parts: Vec<&str> = s.trim().split('-').collect();
        match parts.as_slice() {
            [m, d] => {
                let month: u32 = m.parse().map_err(|_| bad())?;
                let day: u32 = d.parse().map_err(|_| bad())?;
                if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                    return Err(bad());
                }
                Ok(DateSpec::MonthDay { month, day })
            }
            [y, m, d] => {
                let year: i32 = y.parse().map_err(|_| bad())?;
                let month: u32 = m.parse().map_err(|_| bad())?;
                let day: u32 = d.parse().map_err(|_| bad())?;
                let date = NaiveDate::from_ymd_opt(year, month, day)
                    .ok_or(RangeError::InvalidDate { year, month, day })?;
                Ok(DateSpec::Absolute(date))
            }
            _ => Err(bad()),
        }
    }
}

/// An absolute, ordered calendar interval. `start <= end` always holds;
/// a single-day range (`start == end`) is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range from two absolute dates, rejecting reversed input.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A "most recent `days` days" window ending at `today`.
    ///
    /// The fetched span is padded by half again (`days * 3 / 2`) so that a
    /// `days`-deep slice of trading sessions still exists once weekends and
    /// holidays are discounted.
    pub fn lookback(days: u32, today: NaiveDate) -> Self {
        let padded = days.saturating_mul(3) / 2;
        Self {
            start: today - Duration::days(i64::from(padded)),
            end: today,
        }
    }

    /// Inclusive start date.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Inclusive end date.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// The UTC instants covering this range in `tz`: midnight on the start
    /// date through 23:59:59 on the end date (the end date's full session).
    pub fn session_bounds(&self, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>), TzError> {
        let open = self
            .start
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid wall time");
        let close = self
            .end
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is always a valid wall time");
        Ok((from_local_naive(open, tz)?, from_local_naive(close, tz)?))
    }
}

/// Resolve a pair of endpoint specs against a reference date.
///
/// See the module docs for the year-inference rules. Failures are returned
/// synchronously so a custom run can be rejected before anything is
/// scheduled.
pub fn resolve(start: DateSpec, end: DateSpec, today: NaiveDate) -> Result<DateRange, RangeError> {
    let end_date = end.with_year(today.year())?;
    let mut start_date = start.with_year(today.year())?;

    // Year-boundary rule: a reversed all-partial pair means the start belongs
    // to the previous year (e.g. 12-28 .. 01-03 seen from January).
    if start_date > end_date && start.is_partial() && end.is_partial() {
        start_date = start.with_year(today.year() - 1)?;
    }

    if start_date > end_date {
        return Err(RangeError::InvalidRange {
            start: start_date,
            end: end_date,
        });
    }
    if end_date > today {
        return Err(RangeError::FutureRange {
            end: end_date,
            today,
        });
    }
    DateRange::new(start_date, end_date)
}
