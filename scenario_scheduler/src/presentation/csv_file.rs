//! A renderer that snapshots the series to a conventionally named CSV file.
//!
//! Stands in for the real chart artifact in headless runs and tests: same
//! contract, same filename convention, trivially inspectable output.

use std::path::PathBuf;
use std::{env, fs};

use async_trait::async_trait;
use chrono::Utc;
use snafu::ResultExt;

use bar_feed::models::bar_series::BarSeries;

use crate::presentation::{ChartRenderer, IoSnafu, RenderError};

pub struct CsvFileRenderer {
    base_dir: PathBuf,
}

impl CsvFileRenderer {
    /// Write artifacts under an explicit directory (created on first use).
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Write artifacts under the system temp directory, in an
    /// application-specific subfolder.
    pub fn in_temp_dir() -> Self {
        Self::new(env::temp_dir().join("chan_chart"))
    }
}

#[async_trait]
impl ChartRenderer for CsvFileRenderer {
    type Artifact = PathBuf;

    async fn render(
        &self,
        series: &BarSeries,
        title: &str,
        period_label: &str,
    ) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.base_dir).context(IoSnafu)?;

        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let filename = format!("{}_{}_{}.csv", series.symbol, period_label, timestamp);
        let path = self.base_dir.join(filename);

        let mut out = String::with_capacity(64 * (series.len() + 2));
        out.push_str(&format!("# {title}\n"));
        out.push_str("timestamp,open,high,low,close,volume\n");
        for bar in &series.bars {
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                bar.timestamp.to_rfc3339(),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume
            ));
        }
        fs::write(&path, out).context(IoSnafu)?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bar_feed::models::{bar::Bar, period::Period};
    use chrono::TimeZone;

    fn series() -> BarSeries {
        let t0 = chrono::Utc.with_ymd_and_hms(2024, 1, 10, 1, 35, 0).unwrap();
        BarSeries {
            symbol: "000300".to_string(),
            period: Period::Min5,
            bars: vec![
                Bar {
                    timestamp: t0,
                    open: 3420.0,
                    high: 3422.5,
                    low: 3419.0,
                    close: 3421.0,
                    volume: 1200.0,
                },
                Bar {
                    timestamp: t0 + chrono::Duration::minutes(5),
                    open: 3421.0,
                    high: 3424.0,
                    low: 3420.5,
                    close: 3423.5,
                    volume: 900.0,
                },
            ],
        }
    }

    #[tokio::test]
    async fn writes_a_conventionally_named_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = CsvFileRenderer::new(dir.path());

        let path = renderer
            .render(&series(), "000300 5 Min / 5 Days", "5min")
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("000300_5min_"));
        assert!(name.ends_with(".csv"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4); // title + header + two bars
        assert_eq!(lines[0], "# 000300 5 Min / 5 Days");
        assert!(lines[2].starts_with("2024-01-10T01:35:00"));
    }
}
