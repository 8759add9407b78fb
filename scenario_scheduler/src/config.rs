//! Pipeline configuration: parsing, validation, and built-in presets.
//!
//! A TOML file describes the session symbol, the fetch timeout, and the
//! scenario list consumed at startup. Each scenario is either a lookback
//! (`lookback_days`) or an absolute window (`start`/`end` date specs, which
//! go through the [range resolver](bar_feed::range) and are rejected before
//! anything is scheduled).
//!
//! ```toml
//! symbol = "000300"
//! timeout_secs = 30
//!
//! [[scenarios]]
//! label = "5 Min / 15 Days"
//! period = "5min"
//! lookback_days = 15
//!
//! [[scenarios]]
//! label = "December rally"
//! period = "30min"
//! start = "12-01"
//! end = "12-28"
//! ```
//!
//! Entrypoints: [`load_config_str`], [`load_config_path`], and
//! [`PipelineConfig::presets`] for the built-in scenario set.

use std::time::Duration;

use anyhow::{Context, bail};
use bar_feed::models::period::Period;
use bar_feed::range::{self, DateSpec};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::scenario::{self, Scenario};

fn default_symbol() -> String {
    "000300".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Top-level pipeline configuration.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// The symbol every scenario in this session fetches.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Per-fetch timeout; a worker exceeding it fails with a timeout reason.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Scenario list, in display order.
    #[serde(default)]
    pub scenarios: Vec<ScenarioCfg>,
}

/// One configured scenario: a lookback XOR an absolute window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioCfg {
    /// Display label, also the registry key. Must be unique.
    pub label: String,
    /// Bar granularity (`"1"`, `"5min"`, `"30"`, `"daily"`, ...).
    pub period: Period,
    /// Most-recent-N-days window.
    pub lookback_days: Option<u32>,
    /// Absolute window start, `MM-DD` or `YYYY-MM-DD`.
    pub start: Option<String>,
    /// Absolute window end, `MM-DD` or `YYYY-MM-DD`.
    pub end: Option<String>,
}

impl PipelineConfig {
    /// The built-in preset set for the default symbol.
    pub fn presets() -> Self {
        Self {
            symbol: default_symbol(),
            timeout_secs: default_timeout_secs(),
            scenarios: scenario::presets()
                .into_iter()
                .map(|s| {
                    let days = match s.range {
                        scenario::RangeSpec::Lookback { days } => days,
                        scenario::RangeSpec::Absolute(_) => unreachable!("presets are lookbacks"),
                    };
                    ScenarioCfg {
                        label: s.label,
                        period: s.period,
                        lookback_days: Some(days),
                        start: None,
                        end: None,
                    }
                })
                .collect(),
        }
    }

    /// The fetch timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate and materialize the scenario list against a reference date.
    ///
    /// Fails fast: a bad date spec or a reversed/future window is reported
    /// here, before any scenario reaches the scheduler.
    pub fn scenarios(&self, today: NaiveDate) -> anyhow::Result<Vec<Scenario>> {
        let mut out = Vec::with_capacity(self.scenarios.len());
        for cfg in &self.scenarios {
            out.push(
                cfg.to_scenario(today)
                    .with_context(|| format!("scenario {:?}", cfg.label))?,
            );
        }
        let mut labels: Vec<&str> = self.scenarios.iter().map(|c| c.label.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        if labels.len() != self.scenarios.len() {
            bail!("scenario labels must be unique");
        }
        Ok(out)
    }
}

impl ScenarioCfg {
    fn to_scenario(&self, today: NaiveDate) -> anyhow::Result<Scenario> {
        match (self.lookback_days, &self.start, &self.end) {
            (Some(days), None, None) => Ok(Scenario::lookback(&self.label, self.period, days)),
            (None, Some(start), Some(end)) => {
                let start: DateSpec = start.parse()?;
                let end: DateSpec = end.parse()?;
                let range = range::resolve(start, end, today)?;
                Ok(Scenario::absolute(&self.label, self.period, range))
            }
            _ => bail!("exactly one of lookback_days or start+end must be given"),
        }
    }
}

/// Parse and validate a config from a TOML string.
pub fn load_config_str(s: &str) -> anyhow::Result<PipelineConfig> {
    let config: PipelineConfig = from_str(s).context("parsing pipeline config")?;
    Ok(config)
}

/// Parse and validate a config from a file path.
pub fn load_config_path(path: &str) -> anyhow::Result<PipelineConfig> {
    let s = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    load_config_str(&s)
}
