#![cfg(test)]
//! Concurrency contract tests for the scenario scheduler, driven by a
//! scripted in-memory provider: no network, deterministic payloads, and
//! per-call delays so tests can interleave starts, cancels, and completions.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Asia::Shanghai;

use bar_feed::models::period::Period;
use bar_feed::models::request::BarsRequest;
use bar_feed::normalize::{FieldMap, RawTable};
use bar_feed::providers::{DataProvider, ProviderError};
use scenario_scheduler::scenario::Scenario;
use scenario_scheduler::scheduler::Scheduler;
use scenario_scheduler::state::ScenarioPhase;

/// Serves one synthetic bar per call. The bar's volume encodes the call
/// ordinal, so tests can tell *which* fetch produced a ready series.
struct ScriptedProvider {
    calls: AtomicUsize,
    /// Per-call delays; the last one repeats for any further calls.
    delays: Vec<Duration>,
    /// Requests for this period fail with a scripted API error.
    fail_period: Option<Period>,
}

impl ScriptedProvider {
    fn new(delays: Vec<Duration>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delays,
            fail_period: None,
        }
    }

    fn failing_for(period: Period, delays: Vec<Duration>) -> Self {
        Self {
            fail_period: Some(period),
            ..Self::new(delays)
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataProvider for ScriptedProvider {
    fn field_map(&self) -> FieldMap {
        FieldMap {
            timestamp: "time",
            open: "open",
            high: "high",
            low: "low",
            close: "close",
            volume: "volume",
            tz: Shanghai,
        }
    }

    async fn fetch_raw(&self, request: &BarsRequest) -> Result<RawTable, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .delays
            .get(call)
            .or(self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO);
        tokio::time::sleep(delay).await;

        if self.fail_period == Some(request.period) {
            return Err(ProviderError::Api("scripted failure".to_string()));
        }

        let volume = (call + 1) * 100;
        Ok(RawTable {
            columns: ["time", "open", "high", "low", "close", "volume"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: vec![vec![
                "2024-01-10 09:35".to_string(),
                "3420.0".to_string(),
                "3422.5".to_string(),
                "3419.0".to_string(),
                "3421.0".to_string(),
                volume.to_string(),
            ]],
        })
    }
}

fn scheduler_with(provider: Arc<ScriptedProvider>, scenarios: Vec<Scenario>) -> Scheduler {
    Scheduler::new(provider, "000300", scenarios, Duration::from_secs(5))
}

async fn wait_for_terminal(scheduler: &Scheduler, label: &str) {
    for _ in 0..200 {
        if scheduler
            .query(label)
            .is_some_and(|snapshot| snapshot.is_terminal())
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("scenario {label} never reached a terminal phase");
}

#[tokio::test]
async fn starting_twice_while_loading_launches_one_fetch() {
    let provider = Arc::new(ScriptedProvider::new(vec![Duration::from_millis(100)]));
    let scheduler = scheduler_with(
        Arc::clone(&provider),
        vec![Scenario::lookback("5 Min / 5 Days", Period::Min5, 5)],
    );

    assert!(scheduler.start("5 Min / 5 Days"));
    assert!(scheduler.start("5 Min / 5 Days"));

    wait_for_terminal(&scheduler, "5 Min / 5 Days").await;
    assert!(scheduler.is_ready("5 Min / 5 Days"));
    assert_eq!(provider.call_count(), 1, "duplicate provider call issued");
}

#[tokio::test]
async fn cancelled_late_result_never_overwrites_a_newer_fetch() {
    // First call is slow, second is fast: the cancelled first fetch lands
    // well after the replacement has committed.
    let provider = Arc::new(ScriptedProvider::new(vec![
        Duration::from_millis(300),
        Duration::from_millis(10),
    ]));
    let scheduler = scheduler_with(
        Arc::clone(&provider),
        vec![Scenario::lookback("daily", Period::Daily, 60)],
    );

    scheduler.start("daily");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(scheduler.cancel("daily"));
    assert_eq!(
        scheduler.query("daily").unwrap().phase,
        ScenarioPhase::NotRequested
    );

    scheduler.start("daily");
    wait_for_terminal(&scheduler, "daily").await;

    let first = scheduler.query("daily").unwrap();
    let volume = first.series.as_ref().unwrap().bars[0].volume;
    assert_eq!(volume, 200.0, "expected the second fetch's payload");

    // Outlive the cancelled worker, then confirm nothing was clobbered.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let second = scheduler.query("daily").unwrap();
    assert_eq!(second.phase, ScenarioPhase::Ready);
    assert_eq!(second.series.as_ref().unwrap().bars[0].volume, 200.0);
    assert_eq!(second.updated_at, first.updated_at, "stale result committed");
}

#[tokio::test]
async fn snapshots_never_pair_a_series_with_a_non_ready_phase() {
    let provider = Arc::new(ScriptedProvider::new(vec![Duration::from_millis(100)]));
    let scheduler = scheduler_with(
        Arc::clone(&provider),
        vec![Scenario::lookback("1 Min / 1 Day", Period::Min1, 1)],
    );

    let before = scheduler.query("1 Min / 1 Day").unwrap();
    assert_eq!(before.phase, ScenarioPhase::NotRequested);
    assert!(before.series.is_none() && before.error.is_none());

    scheduler.start("1 Min / 1 Day");
    let loading = scheduler.query("1 Min / 1 Day").unwrap();
    if loading.phase == ScenarioPhase::Loading {
        assert!(loading.series.is_none() && loading.error.is_none());
    }

    wait_for_terminal(&scheduler, "1 Min / 1 Day").await;
    let ready = scheduler.query("1 Min / 1 Day").unwrap();
    assert_eq!(ready.phase, ScenarioPhase::Ready);
    assert!(ready.series.is_some() && ready.error.is_none());
}

#[tokio::test]
async fn timeout_surfaces_as_a_timed_out_provider_failure() {
    let provider = Arc::new(ScriptedProvider::new(vec![Duration::from_millis(500)]));
    let scheduler = Scheduler::new(
        provider.clone(),
        "000300",
        vec![Scenario::lookback("slow", Period::Min30, 5)],
        Duration::from_millis(50),
    );

    scheduler.start("slow");
    wait_for_terminal(&scheduler, "slow").await;

    let snapshot = scheduler.query("slow").unwrap();
    assert_eq!(snapshot.phase, ScenarioPhase::Failed);
    let message = snapshot.error.unwrap().to_string();
    assert!(message.contains("timed out"), "got: {message}");
}

#[tokio::test]
async fn one_failing_scenario_does_not_abort_the_others() {
    let provider = Arc::new(ScriptedProvider::failing_for(
        Period::Min1,
        vec![Duration::from_millis(10)],
    ));
    let scheduler = scheduler_with(
        Arc::clone(&provider),
        vec![
            Scenario::lookback("doomed", Period::Min1, 1),
            Scenario::lookback("fine", Period::Daily, 60),
        ],
    );

    scheduler.start_all();
    wait_for_terminal(&scheduler, "doomed").await;
    wait_for_terminal(&scheduler, "fine").await;

    let doomed = scheduler.query("doomed").unwrap();
    assert_eq!(doomed.phase, ScenarioPhase::Failed);
    assert!(doomed.error.unwrap().to_string().contains("scripted failure"));

    assert!(scheduler.is_ready("fine"));
}

#[tokio::test]
async fn start_all_returns_before_any_fetch_completes() {
    let provider = Arc::new(ScriptedProvider::new(vec![Duration::from_millis(200)]));
    let scheduler = scheduler_with(
        Arc::clone(&provider),
        vec![
            Scenario::lookback("a", Period::Min5, 5),
            Scenario::lookback("b", Period::Min30, 15),
            Scenario::lookback("c", Period::Daily, 60),
        ],
    );

    let begun = std::time::Instant::now();
    scheduler.start_all();
    assert!(begun.elapsed() < Duration::from_millis(100), "start_all blocked");

    for label in ["a", "b", "c"] {
        assert!(!scheduler.is_ready(label));
    }
    for label in ["a", "b", "c"] {
        wait_for_terminal(&scheduler, label).await;
        assert!(scheduler.is_ready(label));
    }
}

#[tokio::test]
async fn retry_after_failure_relaunches_the_fetch() {
    let provider = Arc::new(ScriptedProvider::failing_for(
        Period::Min5,
        vec![Duration::from_millis(10)],
    ));
    let scheduler = scheduler_with(
        Arc::clone(&provider),
        vec![Scenario::lookback("flaky", Period::Min5, 5)],
    );

    scheduler.start("flaky");
    wait_for_terminal(&scheduler, "flaky").await;
    assert_eq!(
        scheduler.query("flaky").unwrap().phase,
        ScenarioPhase::Failed
    );

    // Retry goes back through Loading and issues a fresh provider call.
    scheduler.start("flaky");
    wait_for_terminal(&scheduler, "flaky").await;
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn refresh_from_ready_replaces_the_series_atomically() {
    let provider = Arc::new(ScriptedProvider::new(vec![Duration::from_millis(10)]));
    let scheduler = scheduler_with(
        Arc::clone(&provider),
        vec![Scenario::lookback("refresh me", Period::Min30, 15)],
    );

    scheduler.start("refresh me");
    wait_for_terminal(&scheduler, "refresh me").await;
    let old = scheduler.query("refresh me").unwrap().series.unwrap();
    assert_eq!(old.bars[0].volume, 100.0);

    scheduler.start("refresh me");
    wait_for_terminal(&scheduler, "refresh me").await;
    let new = scheduler.query("refresh me").unwrap().series.unwrap();
    assert_eq!(new.bars[0].volume, 200.0);

    // The old snapshot's series is still intact for whoever held it.
    assert_eq!(old.bars[0].volume, 100.0);
}

#[tokio::test]
async fn ad_hoc_scenario_joins_the_registry() {
    let provider = Arc::new(ScriptedProvider::new(vec![Duration::from_millis(10)]));
    let scheduler = scheduler_with(Arc::clone(&provider), vec![]);
    assert!(!scheduler.start("custom"), "unknown label should not start");

    let range = bar_feed::range::DateRange::new(
        chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
    )
    .unwrap();
    scheduler.add(Scenario::absolute("custom", Period::Min30, range));

    assert!(scheduler.start("custom"));
    wait_for_terminal(&scheduler, "custom").await;
    assert!(scheduler.is_ready("custom"));
}
