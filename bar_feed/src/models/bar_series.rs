//! A collection of time-series bars for a specific symbol and period.

use crate::models::{bar::Bar, period::Period};

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`Period`], making the data set self-describing.
///
/// Invariants, established by the [normalizer](crate::normalize) and relied on
/// by every consumer: `bars` is non-empty and timestamps are strictly
/// increasing. Once a series has been handed to the scheduler it is shared
/// behind an `Arc` and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "000300").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub period: Period,
    /// The collection of OHLCV bars.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    /// Number of bars in the series.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// True when the series holds no bars. A successfully normalized series
    /// is never empty; this exists for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The most recent bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}
