use std::time::Duration;

use tracing::warn;

use common::{Config, Error, FetchError, PriceProvider, PriceSeries, Result};

use crate::pacer::Pacer;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Bounded retries with exponential backoff for transient fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_attempts: cfg.fetch_max_attempts.max(1),
            initial_backoff: cfg.fetch_backoff,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Delay before retry number `retry` (1-based): doubles each time, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Fetch `symbol`, pacing every attempt and retrying only `Transient` errors.
///
/// Gives up with `Error::FetchFailure` after `policy.max_attempts`, or straight
/// away on a non-transient error.
pub async fn fetch_with_retry(
    provider: &dyn PriceProvider,
    pacer: &Pacer,
    policy: &RetryPolicy,
    symbol: &str,
    lookback_days: u32,
) -> Result<PriceSeries> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        pacer.wait().await;
        match provider.fetch(symbol, lookback_days).await {
            Ok(series) => return Ok(series),
            Err(e @ FetchError::Transient(_)) if attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    symbol,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    delay = ?delay,
                    "Transient fetch failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(source) => {
                return Err(Error::FetchFailure {
                    attempts: attempt,
                    source,
                })
            }
        }
    }
}
