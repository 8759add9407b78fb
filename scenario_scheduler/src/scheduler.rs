//! The scenario registry and its concurrent fetch scheduler.
//!
//! The scheduler is the single writer of every scenario's state record. All
//! transitions happen under one short-lived table lock that is never held
//! across I/O; the blocking provider call runs in its own tokio task. Readers
//! get value snapshots and never contend with a worker.
//!
//! Stale completions are disambiguated by a per-scenario generation counter:
//! `start`, `cancel`, and scenario replacement each bump the counter, and a
//! finishing worker writes its result back only if the counter still matches
//! the one it was launched with. A cancelled or superseded fetch therefore
//! dies quietly instead of clobbering newer state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bar_feed::fetch::{self, FetchError};
use bar_feed::models::bar_series::BarSeries;
use bar_feed::models::request::BarsRequest;
use bar_feed::providers::DataProvider;
use chrono::Utc;
use indexmap::IndexMap;

use crate::scenario::{EXCHANGE_TZ, Scenario};
use crate::state::{ScenarioPhase, ScenarioSnapshot, ScenarioState};

struct Entry {
    scenario: Scenario,
    state: ScenarioState,
    generation: u64,
    updated_at: chrono::DateTime<Utc>,
}

struct Inner {
    provider: Arc<dyn DataProvider>,
    symbol: String,
    timeout: Duration,
    table: Mutex<IndexMap<String, Entry>>,
}

/// Owns the scenario set and launches at most one fetch worker per scenario.
///
/// Cloning is cheap and every clone drives the same registry, so the handle
/// can be passed to UI callbacks and background tasks alike. All public
/// operations are non-blocking; `start`/`start_all` must be called from
/// within a tokio runtime because they spawn the workers.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Build a registry over `scenarios` for one symbol.
    pub fn new(
        provider: Arc<dyn DataProvider>,
        symbol: impl Into<String>,
        scenarios: Vec<Scenario>,
        timeout: Duration,
    ) -> Self {
        let table = scenarios
            .into_iter()
            .map(|scenario| {
                let entry = Entry {
                    scenario: scenario.clone(),
                    state: ScenarioState::NotRequested,
                    generation: 0,
                    updated_at: Utc::now(),
                };
                (scenario.label, entry)
            })
            .collect();
        Self {
            inner: Arc::new(Inner {
                provider,
                symbol: symbol.into(),
                timeout,
                table: Mutex::new(table),
            }),
        }
    }

    /// Register an ad hoc scenario (custom run). Replacing an existing label
    /// supersedes it: the old entry's in-flight fetch, if any, becomes stale.
    pub fn add(&self, scenario: Scenario) {
        let mut table = self.inner.lock_table();
        let label = scenario.label.clone();
        let generation = table.get(&label).map_or(0, |e| e.generation + 1);
        table.insert(
            label,
            Entry {
                scenario,
                state: ScenarioState::NotRequested,
                generation,
                updated_at: Utc::now(),
            },
        );
    }

    /// Registered labels, in registration order.
    pub fn labels(&self) -> Vec<String> {
        self.inner.lock_table().keys().cloned().collect()
    }

    /// Launch the fetch for one scenario. Returns `false` for an unknown
    /// label. While the scenario is already `Loading` this is a no-op: no
    /// second worker is spawned. From `Ready` it acts as a forced refresh,
    /// from `Failed` as a retry.
    pub fn start(&self, label: &str) -> bool {
        let mut table = self.inner.lock_table();
        let Some(entry) = table.get_mut(label) else {
            tracing::warn!(label, "start requested for unknown scenario");
            return false;
        };
        if matches!(entry.state, ScenarioState::Loading) {
            tracing::debug!(label, "already loading, start is a no-op");
            return true;
        }

        entry.generation += 1;
        let generation = entry.generation;

        let today = Utc::now().with_timezone(&EXCHANGE_TZ).date_naive();
        let request = match entry.scenario.request(&self.inner.symbol, today) {
            Ok(request) => request,
            Err(e) => {
                // Unreachable for DST-free exchange zones; recorded as a
                // per-scenario failure rather than poisoning the registry.
                entry.state =
                    ScenarioState::Failed(FetchError::Provider(format!("range conversion: {e}")));
                entry.updated_at = Utc::now();
                return true;
            }
        };

        entry.state = ScenarioState::Loading;
        entry.updated_at = Utc::now();
        tracing::info!(label, generation, "fetch launched");
        drop(table);

        let inner = Arc::clone(&self.inner);
        let label = label.to_string();
        tokio::spawn(async move {
            let outcome = inner.fetch_with_timeout(&request).await;
            inner.complete(&label, generation, outcome);
        });
        true
    }

    /// Launch every registered scenario concurrently and return immediately.
    /// Completion order is not defined; scenarios are independent.
    pub fn start_all(&self) {
        for label in self.labels() {
            self.start(&label);
        }
    }

    /// Non-blocking snapshot of one scenario's state, or `None` for an
    /// unknown label. The snapshot is a value copy: it either predates or
    /// postdates any concurrent transition, never interleaves one.
    pub fn query(&self, label: &str) -> Option<ScenarioSnapshot> {
        let table = self.inner.lock_table();
        table
            .get(label)
            .map(|entry| ScenarioSnapshot::of(label, &entry.state, entry.updated_at))
    }

    /// Convenience read: is the scenario's series ready to render?
    pub fn is_ready(&self, label: &str) -> bool {
        self.query(label)
            .is_some_and(|s| s.phase == ScenarioPhase::Ready)
    }

    /// Abandon an in-flight fetch. The scenario returns to `NotRequested`
    /// and the worker's eventual result is dropped as stale. Cancelling a
    /// scenario that is not `Loading` changes nothing.
    pub fn cancel(&self, label: &str) -> bool {
        let mut table = self.inner.lock_table();
        let Some(entry) = table.get_mut(label) else {
            return false;
        };
        if !matches!(entry.state, ScenarioState::Loading) {
            return false;
        }
        entry.generation += 1;
        entry.state = ScenarioState::NotRequested;
        entry.updated_at = Utc::now();
        tracing::info!(label, "fetch cancelled");
        true
    }
}

impl Inner {
    fn lock_table(&self) -> std::sync::MutexGuard<'_, IndexMap<String, Entry>> {
        self.table.lock().expect("scenario table lock poisoned")
    }

    async fn fetch_with_timeout(&self, request: &BarsRequest) -> Result<BarSeries, FetchError> {
        match tokio::time::timeout(self.timeout, fetch::run(self.provider.as_ref(), request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Provider(format!(
                "timed out after {:?}",
                self.timeout
            ))),
        }
    }

    /// Commit a worker's outcome, unless the scenario moved on underneath it.
    fn complete(&self, label: &str, generation: u64, outcome: Result<BarSeries, FetchError>) {
        let mut table = self.lock_table();
        let Some(entry) = table.get_mut(label) else {
            return;
        };
        if entry.generation != generation {
            tracing::debug!(
                label,
                stale = generation,
                current = entry.generation,
                "dropping stale fetch result"
            );
            return;
        }
        entry.state = match outcome {
            Ok(series) => {
                tracing::info!(label, bars = series.len(), "fetch ready");
                ScenarioState::Ready(Arc::new(series))
            }
            Err(error) => {
                tracing::warn!(label, %error, "fetch failed");
                ScenarioState::Failed(error)
            }
        };
        entry.updated_at = Utc::now();
    }
}
