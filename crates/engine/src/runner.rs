use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use common::{AnalysisResult, Config, Instrument, PriceProvider, RunStatistics, ScreenerConfig};
use screener::{analyze, rank, RankedResults, StatisticsCollector};

use crate::pacer::Pacer;
use crate::retry::{fetch_with_retry, RetryPolicy};

/// Everything one batch produced.
#[derive(Debug, Clone)]
pub struct ScreenReport {
    /// One result per requested instrument, in universe order.
    pub results: Vec<AnalysisResult>,
    pub ranked: RankedResults,
    pub statistics: RunStatistics,
}

/// Screens a universe against a price provider with a bounded worker pool.
pub struct BatchRunner {
    provider: Arc<dyn PriceProvider>,
    pacer: Pacer,
    retry: RetryPolicy,
    config: ScreenerConfig,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(provider: Arc<dyn PriceProvider>, cfg: &Config) -> Self {
        Self {
            provider,
            pacer: Pacer::new(cfg.api_delay),
            retry: RetryPolicy::from_config(cfg),
            config: cfg.screener.clone(),
            concurrency: cfg.concurrency,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Fetch and analyze every instrument. Never fails as a whole: a symbol
    /// that cannot be fetched becomes a `DATA_ERROR` result.
    pub async fn run(&self, universe: &[Instrument]) -> ScreenReport {
        let total = universe.len();
        info!(
            instruments = total,
            concurrency = self.concurrency,
            api_delay = ?self.pacer.interval(),
            "Screening started"
        );

        let mut collector = StatisticsCollector::new();
        let mut indexed: Vec<(usize, AnalysisResult)> = Vec::with_capacity(total);

        let mut outcomes = stream::iter(universe.iter().enumerate())
            .map(|(idx, instrument)| async move { (idx, self.screen_one(instrument).await) })
            .buffer_unordered(self.concurrency.max(1));

        while let Some((idx, result)) = outcomes.next().await {
            collector.record(&result);
            info!(
                symbol = %result.symbol,
                done = indexed.len() + 1,
                total,
                verdict = %result.verdict,
                reason = result.failure_reason.map(|r| r.to_string()).unwrap_or_default(),
                "Analyzed"
            );
            indexed.push((idx, result));
        }

        indexed.sort_by_key(|(idx, _)| *idx);
        let results: Vec<AnalysisResult> = indexed.into_iter().map(|(_, r)| r).collect();
        let ranked = rank(&results);
        let statistics = collector.summary();

        info!(
            total = statistics.total_analyzed,
            passed = statistics.passed,
            failed = statistics.failed(),
            "Screening finished"
        );

        ScreenReport {
            results,
            ranked,
            statistics,
        }
    }

    async fn screen_one(&self, instrument: &Instrument) -> AnalysisResult {
        let fetched = fetch_with_retry(
            self.provider.as_ref(),
            &self.pacer,
            &self.retry,
            &instrument.symbol,
            self.config.data_days,
        )
        .await;

        match fetched {
            Ok(series) => analyze(instrument, &series, &self.config),
            Err(e) => {
                warn!(symbol = %instrument.symbol, error = %e, "Price data unavailable");
                AnalysisResult::data_error(instrument, e)
            }
        }
    }
}
