//! The boundary between the scheduler and whatever draws charts.
//!
//! Chart rendering itself is an external collaborator; this module defines
//! the [`ChartRenderer`] trait it must implement and the [`present`] guard
//! that the UI layer calls. The guard queries the scheduler first and hands a
//! series to the renderer only when its phase is `Ready`. A mid-fetch or
//! failed scenario surfaces as a signal for the user, never as a partial or
//! stale chart.

pub mod csv_file;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use bar_feed::fetch::FetchError;
use bar_feed::models::bar_series::BarSeries;

use crate::scheduler::Scheduler;
use crate::state::ScenarioPhase;

/// Errors from a renderer implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RenderError {
    /// The renderer could not produce its artifact.
    #[snafu(display("Failed to produce chart artifact: {message}"))]
    Artifact {
        message: String,
        backtrace: Backtrace,
    },

    /// A generic I/O error while writing the artifact.
    #[snafu(display("I/O error: {source}"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

/// Errors from the presentation guard itself.
#[derive(Debug, Snafu)]
pub enum PresentError {
    /// The label is not in the registry.
    #[snafu(display("unknown scenario: {label}"))]
    UnknownScenario { label: String },

    /// The scenario was ready but the renderer failed.
    #[snafu(transparent)]
    Render { source: RenderError },
}

#[async_trait]
pub trait ChartRenderer {
    /// What a successful render produces.
    ///
    /// This keeps the trait flexible: a file renderer returns the saved
    /// path, an embedded renderer returns a displayable object.
    type Artifact;

    /// Render one canonical series under the given title.
    async fn render(
        &self,
        series: &BarSeries,
        title: &str,
        period_label: &str,
    ) -> Result<Self::Artifact, RenderError>;
}

/// What the user gets for one scenario.
#[derive(Debug)]
pub enum Presentation<A> {
    /// The series was ready; here is the rendered artifact.
    Rendered(A),
    /// Not ready yet; show a "please wait" signal and poll again.
    NotReady(ScenarioPhase),
    /// The fetch failed; show the typed reason and offer a retry.
    Failed(FetchError),
}

/// Query-then-render guard. Never touches a series mid-fetch.
pub async fn present<R: ChartRenderer>(
    scheduler: &Scheduler,
    label: &str,
    renderer: &R,
) -> Result<Presentation<R::Artifact>, PresentError> {
    let snapshot = scheduler
        .query(label)
        .ok_or_else(|| PresentError::UnknownScenario {
            label: label.to_string(),
        })?;

    match snapshot.phase {
        ScenarioPhase::Ready => {
            let series = snapshot
                .series
                .expect("Ready snapshot always carries a series");
            let title = format!("{} {}", series.symbol, label);
            let artifact = renderer
                .render(&series, &title, series.period.label())
                .await?;
            Ok(Presentation::Rendered(artifact))
        }
        ScenarioPhase::Failed => {
            let error = snapshot
                .error
                .expect("Failed snapshot always carries an error");
            Ok(Presentation::Failed(error))
        }
        phase => Ok(Presentation::NotReady(phase)),
    }
}
