use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use common::{Candle, Config, FailureReason, FetchError, Instrument, PriceProvider, PriceSeries, Verdict};
use engine::{BatchRunner, RetryPolicy};

/// Serves canned series by symbol. Unknown symbols are `NotFound`, symbols in
/// `flaky` always fail with a transient error.
struct InMemory {
    series: HashMap<String, PriceSeries>,
    flaky: Vec<String>,
    calls: AtomicU32,
}

impl InMemory {
    fn new() -> Self {
        Self {
            series: HashMap::new(),
            flaky: Vec::new(),
            calls: AtomicU32::new(0),
        }
    }

    fn with(mut self, symbol: &str, series: PriceSeries) -> Self {
        self.series.insert(symbol.to_string(), series);
        self
    }

    fn flaky(mut self, symbol: &str) -> Self {
        self.flaky.push(symbol.to_string());
        self
    }
}

#[async_trait]
impl PriceProvider for InMemory {
    async fn fetch(&self, symbol: &str, _lookback_days: u32) -> Result<PriceSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // vary completion order
        tokio::time::sleep(Duration::from_millis(symbol.len() as u64 % 3)).await;
        if self.flaky.iter().any(|s| s == symbol) {
            return Err(FetchError::Transient(format!("{symbol}: 503")));
        }
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(symbol.to_string()))
    }
}

fn series(closes: impl Iterator<Item = f64>) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let candles = closes
        .enumerate()
        .map(|(i, close)| Candle {
            date: start + Days::new(i as u64),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 10_000.0,
        })
        .collect();
    PriceSeries::new(candles).unwrap()
}

/// Steady +0.5/day climb: passes every check with default parameters.
fn rising() -> PriceSeries {
    series((0..30).map(|i| 100.0 + i as f64 * 0.5))
}

/// Steady decline: closes end below the EMA.
fn falling() -> PriceSeries {
    series((0..30).map(|i| 200.0 - i as f64))
}

fn config(concurrency: usize) -> Config {
    Config {
        api_delay: Duration::ZERO,
        fetch_backoff: Duration::from_millis(1),
        concurrency,
        ..Config::default()
    }
}

fn provider() -> Arc<InMemory> {
    Arc::new(
        InMemory::new()
            .with("UP.NS", rising())
            .with("UPTOO.NS", rising())
            .with("DOWN.NS", falling())
            .with("SHORT.NS", series((0..5).map(|i| 10.0 + i as f64)))
            .flaky("FLAKY.NS"),
    )
}

fn universe() -> Vec<Instrument> {
    ["UP.NS", "DOWN.NS", "FLAKY.NS", "UPTOO.NS", "GONE.NS", "SHORT.NS", "UP.NS"]
        .into_iter()
        .map(|s| Instrument::new(s, format!("{s} Ltd")))
        .collect()
}

#[tokio::test]
async fn results_follow_universe_order() {
    let report = BatchRunner::new(provider(), &config(4)).run(&universe()).await;

    let symbols: Vec<_> = report.results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(
        symbols,
        ["UP.NS", "DOWN.NS", "FLAKY.NS", "UPTOO.NS", "GONE.NS", "SHORT.NS", "UP.NS"]
    );
    assert_eq!(report.results[1].failure_reason, Some(FailureReason::NotUptrend));
    assert_eq!(report.results[4].failure_reason, Some(FailureReason::DataError));
    assert_eq!(report.results[5].failure_reason, Some(FailureReason::DataError));
}

#[tokio::test]
async fn duplicates_yield_independent_results() {
    let report = BatchRunner::new(provider(), &config(4)).run(&universe()).await;

    assert_eq!(report.results[0], report.results[6]);
    assert_eq!(report.results[0].verdict, Verdict::Pass);
    assert_eq!(report.statistics.total_analyzed, 7);
    // UP.NS twice plus UPTOO.NS
    assert_eq!(report.ranked.len(), 3);
}

#[tokio::test]
async fn transient_failures_are_retried_then_reported_as_data_errors() {
    let provider = Arc::new(InMemory::new().flaky("FLAKY.NS"));
    let runner = BatchRunner::new(provider.clone(), &config(1)).with_retry(RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    });

    let report = runner.run(&[Instrument::new("FLAKY.NS", "Flaky Ltd")]).await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    let result = &report.results[0];
    assert_eq!(result.verdict, Verdict::Fail);
    assert_eq!(result.failure_reason, Some(FailureReason::DataError));
    assert!(result.error.as_deref().unwrap_or_default().contains("3 attempt"));
    assert_eq!(result.current_price, None);
}

#[tokio::test]
async fn statistics_do_not_depend_on_concurrency() {
    let sequential = BatchRunner::new(provider(), &config(1)).run(&universe()).await;

    for concurrency in [2, 3, 8] {
        let parallel = BatchRunner::new(provider(), &config(concurrency))
            .run(&universe())
            .await;
        assert_eq!(parallel.statistics, sequential.statistics);
        assert_eq!(parallel.results, sequential.results);
    }

    let stats = &sequential.statistics;
    assert_eq!(stats.passed, 3);
    assert_eq!(stats.failure_count(FailureReason::DataError), 3);
    assert_eq!(stats.failure_count(FailureReason::NotUptrend), 1);
    assert_eq!(stats.passed + stats.failed(), stats.total_analyzed);
}

#[tokio::test]
async fn empty_universe_gives_an_empty_report() {
    let report = BatchRunner::new(provider(), &config(4)).run(&[]).await;
    assert!(report.results.is_empty());
    assert!(report.ranked.is_empty());
    assert_eq!(report.statistics.total_analyzed, 0);
}
