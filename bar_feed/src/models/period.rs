//! Bar sampling granularities supported by the pipeline.
//!
//! Unlike a free-form amount × unit pair, the chart tool only ever requests
//! one of four granularities, so [`Period`] is a closed enum. Each variant
//! knows its vendor kline code, a filename-friendly label, and a
//! human-readable display form.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeriodError {
    #[error("Invalid period: {input} (allowed: 1, 5, 30, daily)")]
    InvalidInput { input: String },
}

/// Sampling granularity of a bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    /// One-minute bars.
    Min1,
    /// Five-minute bars.
    Min5,
    /// Thirty-minute bars.
    Min30,
    /// Daily bars.
    Daily,
}

impl Period {
    /// The `klt` code used by the kline endpoint for this granularity.
    pub fn kline_code(&self) -> &'static str {
        match self {
            Period::Min1 => "1",
            Period::Min5 => "5",
            Period::Min30 => "30",
            Period::Daily => "101",
        }
    }

    /// Filename-friendly label (e.g., `5min`, `daily`).
    pub fn label(&self) -> &'static str {
        match self {
            Period::Min1 => "1min",
            Period::Min5 => "5min",
            Period::Min30 => "30min",
            Period::Daily => "daily",
        }
    }

    /// True for the intraday granularities.
    pub fn is_intraday(&self) -> bool {
        !matches!(self, Period::Daily)
    }

    /// All supported granularities, coarsest last.
    pub fn all() -> [Period; 4] {
        [Period::Min1, Period::Min5, Period::Min30, Period::Daily]
    }
}

/// Display/parse for CLI and config ergonomics (`"1"`, `"5"`, `"30"`, `"daily"`).
impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Min1 => "1 Min",
            Period::Min5 => "5 Min",
            Period::Min30 => "30 Min",
            Period::Daily => "Daily",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "1min" | "1m" => Ok(Period::Min1),
            "5" | "5min" | "5m" => Ok(Period::Min5),
            "30" | "30min" | "30m" => Ok(Period::Min30),
            "d" | "day" | "daily" => Ok(Period::Daily),
            _ => Err(PeriodError::InvalidInput {
                input: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> String {
        p.label().to_string()
    }
}
