//! Universal parameters for requesting time-series bar data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::period::Period;

/// Vendor-agnostic parameters for one bars request.
///
/// This is the standard input for all [`DataProvider`](crate::providers::DataProvider)
/// implementations. One request covers exactly one symbol; the pipeline never
/// fetches portfolios.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarsRequest {
    /// The symbol to request (e.g., `"000300"`).
    pub symbol: String,

    /// The time interval for each bar.
    pub period: Period,

    /// Start of the requested time range (inclusive, UTC).
    ///
    /// Providers should return bars at or after this timestamp.
    pub start: DateTime<Utc>,

    /// End of the requested time range (inclusive, UTC).
    ///
    /// Providers should return bars at or before this timestamp.
    pub end: DateTime<Utc>,
}
