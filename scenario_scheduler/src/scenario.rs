//! Scenario definitions: what to fetch, not how far along the fetch is.
//!
//! Scenarios are immutable after creation. The mutable lifecycle record lives
//! with the [scheduler](crate::scheduler); only that record changes as a
//! fetch progresses.

use bar_feed::models::{period::Period, request::BarsRequest};
use bar_feed::range::DateRange;
use bar_feed::tz::TzError;
use chrono::NaiveDate;
use chrono_tz::Tz;

/// Wall-clock zone of the exchanges this tool charts. Lookback windows and
/// session bounds are computed against this zone, not UTC.
pub const EXCHANGE_TZ: Tz = chrono_tz::Asia::Shanghai;

/// The window a scenario covers: fixed dates, or relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// The most recent `days` days, re-anchored every time the scenario
    /// starts (so a refresh picks up new sessions).
    Lookback { days: u32 },
    /// A fixed absolute window, resolved and validated before the scenario
    /// was created.
    Absolute(DateRange),
}

/// One named fetch unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Display label, also the registry key (e.g., `"5 Min / 15 Days"`).
    pub label: String,
    /// Bar granularity to request.
    pub period: Period,
    /// The window to cover.
    pub range: RangeSpec,
}

impl Scenario {
    /// A scenario covering the most recent `days` days.
    pub fn lookback(label: impl Into<String>, period: Period, days: u32) -> Self {
        Self {
            label: label.into(),
            period,
            range: RangeSpec::Lookback { days },
        }
    }

    /// A scenario covering a fixed, already-resolved window.
    pub fn absolute(label: impl Into<String>, period: Period, range: DateRange) -> Self {
        Self {
            label: label.into(),
            period,
            range: RangeSpec::Absolute(range),
        }
    }

    /// Materialize the fetch request for `symbol` as of `today`.
    ///
    /// Lookback windows widen to the window the preset family shares
    /// (15 days intraday, 60 daily), so presets that differ only in display
    /// depth hit the same fetch span.
    pub fn request(&self, symbol: &str, today: NaiveDate) -> Result<BarsRequest, TzError> {
        let range = match self.range {
            RangeSpec::Lookback { days } => DateRange::lookback(self.fetch_days(days), today),
            RangeSpec::Absolute(range) => range,
        };
        let (start, end) = range.session_bounds(EXCHANGE_TZ)?;
        Ok(BarsRequest {
            symbol: symbol.to_string(),
            period: self.period,
            start,
            end,
        })
    }

    fn fetch_days(&self, days: u32) -> u32 {
        if self.period.is_intraday() {
            days.max(15)
        } else {
            days.max(60)
        }
    }
}

/// The built-in preset scenarios, in toolbar order.
pub fn presets() -> Vec<Scenario> {
    vec![
        Scenario::lookback("1 Min / 1 Day", Period::Min1, 1),
        Scenario::lookback("1 Min / 5 Days", Period::Min1, 5),
        Scenario::lookback("5 Min / 5 Days", Period::Min5, 5),
        Scenario::lookback("5 Min / 15 Days", Period::Min5, 15),
        Scenario::lookback("30 Min / 5 Days", Period::Min30, 5),
        Scenario::lookback("30 Min / 15 Days", Period::Min30, 15),
        Scenario::lookback("Daily / 60 Days", Period::Daily, 60),
    ]
}
