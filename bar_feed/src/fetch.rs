//! A single unit of fetch work: one request, one provider call, one outcome.
//!
//! [`run`] wraps an external [`DataProvider`] call and the
//! [normalizer](crate::normalize) into a terminal result. Exactly one
//! provider call is issued per invocation; retries and timeouts are the
//! scheduler's policy, not this module's.

use thiserror::Error;

use crate::models::bar_series::BarSeries;
use crate::models::request::BarsRequest;
use crate::normalize::{NormalizeError, normalize};
use crate::providers::DataProvider;

/// Terminal outcome of one fetch. `Clone + PartialEq` so the scheduler can
/// park it in a state record and tests can assert on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Transport, authentication, or API failure, with the provider's
    /// message preserved for diagnostics.
    #[error("provider error: {0}")]
    Provider(String),

    /// The provider answered successfully but returned no bars at all.
    #[error("provider returned no bars")]
    EmptyResult,

    /// The raw table failed normalization.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Fetch and normalize the bars for one request.
///
/// An empty raw response is an [`FetchError::EmptyResult`], not a success:
/// downstream consumers rely on a `Ready` series being non-empty.
pub async fn run(
    provider: &dyn DataProvider,
    request: &BarsRequest,
) -> Result<BarSeries, FetchError> {
    let table = provider
        .fetch_raw(request)
        .await
        .map_err(|e| FetchError::Provider(e.to_string()))?;

    if table.is_empty() {
        tracing::warn!(symbol = %request.symbol, period = %request.period, "empty raw response");
        return Err(FetchError::EmptyResult);
    }

    let series = normalize(&table, &provider.field_map(), &request.symbol, request.period)?;
    tracing::debug!(
        symbol = %request.symbol,
        period = %request.period,
        bars = series.len(),
        "fetch complete"
    );
    Ok(series)
}
