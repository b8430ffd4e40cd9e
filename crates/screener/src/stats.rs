use tracing::warn;

use common::{AnalysisResult, FailureReason, RunStatistics, Verdict};

/// Tallies outcomes across a run.
///
/// Either feed every result through one collector, or give each worker its own
/// and `merge` them after the join; both give the same totals.
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    stats: RunStatistics,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &AnalysisResult) {
        self.stats.total_analyzed += 1;
        match result.verdict {
            Verdict::Pass => self.stats.passed += 1,
            Verdict::Fail => {
                let reason = result.failure_reason.unwrap_or_else(|| {
                    warn!(symbol = %result.symbol, "FAIL result without a reason, counting as DATA_ERROR");
                    FailureReason::DataError
                });
                *self.stats.failures.entry(reason).or_default() += 1;
            }
        }
    }

    pub fn merge(&mut self, other: StatisticsCollector) {
        self.stats.total_analyzed += other.stats.total_analyzed;
        self.stats.passed += other.stats.passed;
        for (reason, count) in other.stats.failures {
            *self.stats.failures.entry(reason).or_default() += count;
        }
    }

    pub fn summary(&self) -> RunStatistics {
        self.stats.clone()
    }
}

impl<'a> Extend<&'a AnalysisResult> for StatisticsCollector {
    fn extend<I: IntoIterator<Item = &'a AnalysisResult>>(&mut self, iter: I) {
        for result in iter {
            self.record(result);
        }
    }
}
