use async_trait::async_trait;

use crate::{FetchError, PriceSeries};

/// Source of daily price history.
///
/// `YahooClient` in `crates/engine` implements this against the Yahoo Finance
/// chart API; tests plug in canned series. Retries and pacing are applied by
/// the caller, so implementations make exactly one attempt per call.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch roughly `lookback_days` of daily candles ending today.
    async fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries, FetchError>;
}
