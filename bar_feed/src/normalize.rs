//! Conversion of raw provider tables into canonical [`BarSeries`].
//!
//! Providers return their payloads as a [`RawTable`]: labeled columns of
//! string cells, in whatever order and under whatever names the vendor uses.
//! Each provider supplies a [`FieldMap`] naming its columns for the six
//! canonical fields and the time zone its timestamps are quoted in.
//!
//! Normalization is all-or-nothing: one bad cell fails the whole series. A
//! silently gapped series would corrupt the chart it feeds, so there is no
//! drop-and-continue path.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use thiserror::Error;

use crate::models::{bar::Bar, bar_series::BarSeries, period::Period};
use crate::tz::from_local_naive;

/// Errors produced while normalizing a raw table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// A required column is missing, a row is short, or a cell failed to
    /// parse as a valid timestamp / non-negative finite number.
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// Sorting did not restore strictly increasing timestamps, which means
    /// the source returned duplicates.
    #[error("duplicate or non-increasing timestamps after sorting")]
    UnorderedData,
}

/// A labeled tabular payload as returned by a provider, before any
/// interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Source column labels, in source order.
    pub columns: Vec<String>,
    /// Row cells, one `Vec<String>` per row, aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// True when the table carries no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Source-specific column names for the canonical bar fields, plus the time
/// zone the source quotes its timestamps in.
#[derive(Debug, Clone)]
pub struct FieldMap {
    pub timestamp: &'static str,
    pub open: &'static str,
    pub high: &'static str,
    pub low: &'static str,
    pub close: &'static str,
    pub volume: &'static str,
    /// Wall-clock zone of the source timestamps.
    pub tz: Tz,
}

/// Parse an exchange-local timestamp cell. Daily bars come as bare dates,
/// intraday bars with or without seconds.
fn parse_timestamp(cell: &str, tz: Tz) -> Result<DateTime<Utc>, NormalizeError> {
    let naive: NaiveDateTime = NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(cell, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
        })
        .map_err(|_| NormalizeError::MalformedData(format!("unparsable timestamp: {cell}")))?;
    from_local_naive(naive, tz)
        .map_err(|e| NormalizeError::MalformedData(format!("timestamp {cell}: {e}")))
}

/// Parse a price or volume cell: decimal, finite, non-negative.
fn parse_value(cell: &str, field: &str) -> Result<f64, NormalizeError> {
    let value: f64 = cell.trim().parse().map_err(|_| {
        NormalizeError::MalformedData(format!("non-numeric {field}: {cell:?}"))
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(NormalizeError::MalformedData(format!(
            "negative or non-finite {field}: {cell}"
        )));
    }
    Ok(value)
}

fn column_index(table: &RawTable, label: &str) -> Result<usize, NormalizeError> {
    table
        .columns
        .iter()
        .position(|c| c == label)
        .ok_or_else(|| NormalizeError::MalformedData(format!("missing column: {label}")))
}

/// Normalize a raw table into a canonical series for `symbol` at `period`.
///
/// Descending sources are re-sorted once; if strict monotonicity still does
/// not hold afterwards the series fails with [`NormalizeError::UnorderedData`].
pub fn normalize(
    table: &RawTable,
    map: &FieldMap,
    symbol: &str,
    period: Period,
) -> Result<BarSeries, NormalizeError> {
    if table.is_empty() {
        return Err(NormalizeError::MalformedData("no rows in table".into()));
    }

    let ts_idx = column_index(table, map.timestamp)?;
    let open_idx = column_index(table, map.open)?;
    let high_idx = column_index(table, map.high)?;
    let low_idx = column_index(table, map.low)?;
    let close_idx = column_index(table, map.close)?;
    let volume_idx = column_index(table, map.volume)?;
    let width = [ts_idx, open_idx, high_idx, low_idx, close_idx, volume_idx]
        .into_iter()
        .max()
        .expect("six indices")
        + 1;

    let mut bars = Vec::with_capacity(table.rows.len());
    for (row_no, row) in table.rows.iter().enumerate() {
        if row.len() < width {
            return Err(NormalizeError::MalformedData(format!(
                "row {row_no} has {} fields, expected at least {width}",
                row.len()
            )));
        }
        bars.push(Bar {
            timestamp: parse_timestamp(&row[ts_idx], map.tz)?,
            open: parse_value(&row[open_idx], "open")?,
            high: parse_value(&row[high_idx], "high")?,
            low: parse_value(&row[low_idx], "low")?,
            close: parse_value(&row[close_idx], "close")?,
            volume: parse_value(&row[volume_idx], "volume")?,
        });
    }

    // One sort handles descending sources; duplicates survive a sort, so a
    // strictness check afterwards distinguishes UnorderedData.
    bars.sort_by_key(|bar| bar.timestamp);
    if bars.windows(2).any(|w| w[0].timestamp >= w[1].timestamp) {
        return Err(NormalizeError::UnorderedData);
    }

    tracing::debug!(symbol, rows = bars.len(), "normalized raw table");
    Ok(BarSeries {
        symbol: symbol.to_string(),
        period,
        bars,
    })
}
