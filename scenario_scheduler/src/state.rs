//! Per-scenario lifecycle state and the snapshot type handed to readers.
//!
//! The state machine is linear with one retry edge:
//!
//! ```text
//! NotRequested --start--> Loading --success--> Ready
//!                   |                 |
//!                   |                 +--failure--> Failed --retry--> Loading
//!                   +--cancel------------------------------> NotRequested
//! ```
//!
//! `Ready` may re-enter `Loading` on a forced refresh; the scheduler commits
//! that transition atomically so no reader ever sees a half-replaced record.

use std::sync::Arc;

use bar_feed::fetch::FetchError;
use bar_feed::models::bar_series::BarSeries;
use chrono::{DateTime, Utc};

/// Lifecycle phase of a scenario, as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioPhase {
    /// Initial; no resources held.
    NotRequested,
    /// A fetch worker is in flight.
    Loading,
    /// Terminal success; a series is available.
    Ready,
    /// Terminal until retried; a typed failure reason is available.
    Failed,
}

/// Internal state record. The series lives *inside* the `Ready` variant and
/// the failure inside `Failed`, so no representable state pairs a series
/// with a non-Ready phase.
#[derive(Debug, Clone)]
pub(crate) enum ScenarioState {
    NotRequested,
    Loading,
    Ready(Arc<BarSeries>),
    Failed(FetchError),
}

impl ScenarioState {
    pub(crate) fn phase(&self) -> ScenarioPhase {
        match self {
            ScenarioState::NotRequested => ScenarioPhase::NotRequested,
            ScenarioState::Loading => ScenarioPhase::Loading,
            ScenarioState::Ready(_) => ScenarioPhase::Ready,
            ScenarioState::Failed(_) => ScenarioPhase::Failed,
        }
    }
}

/// An immutable copy of one scenario's state at query time.
///
/// Cheap to produce: the series is shared by `Arc`, never cloned bar-by-bar.
/// Holding a snapshot keeps its series alive even if the scheduler moves on
/// to a newer fetch.
#[derive(Debug, Clone)]
pub struct ScenarioSnapshot {
    /// Registry label of the scenario.
    pub label: String,
    /// Phase at the moment of the query.
    pub phase: ScenarioPhase,
    /// The series, present exactly when `phase` is [`ScenarioPhase::Ready`].
    pub series: Option<Arc<BarSeries>>,
    /// The failure, present exactly when `phase` is [`ScenarioPhase::Failed`].
    pub error: Option<FetchError>,
    /// When the scenario last changed phase.
    pub updated_at: DateTime<Utc>,
}

impl ScenarioSnapshot {
    pub(crate) fn of(label: &str, state: &ScenarioState, updated_at: DateTime<Utc>) -> Self {
        let (series, error) = match state {
            ScenarioState::Ready(series) => (Some(Arc::clone(series)), None),
            ScenarioState::Failed(err) => (None, Some(err.clone())),
            _ => (None, None),
        };
        Self {
            label: label.to_string(),
            phase: state.phase(),
            series,
            error,
            updated_at,
        }
    }

    /// True once the scenario has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, ScenarioPhase::Ready | ScenarioPhase::Failed)
    }
}
