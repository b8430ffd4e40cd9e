use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use tracing::debug;

use common::{Error, FetchError, PriceProvider, PriceSeries, Result};

use super::response::parse_chart;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Calendar days added on top of the requested history to cover weekends and
/// exchange holidays.
const CALENDAR_BUFFER_DAYS: i64 = 30;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) ema-screener/0.1";

/// Daily bars from the Yahoo Finance v8 chart endpoint.
pub struct YahooClient {
    base_url: String,
    http: Client,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_chart(&self, symbol: &str, lookback_days: u32) -> Result<String, FetchError> {
        let end = Utc::now().timestamp();
        let start = end - (i64::from(lookback_days) + CALENDAR_BUFFER_DAYS) * 86_400;
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("period1", start.to_string()),
                ("period2", end.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transient(format!("{symbol}: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Transient(format!("{symbol}: {e}")))?;

        if status.is_success() {
            return Ok(body);
        }
        Err(classify_status(symbol, status, &body))
    }
}

/// Map a non-success HTTP status to a fetch error. A 404 still carries a chart
/// body, but the status alone is enough to know the symbol is unknown.
fn classify_status(symbol: &str, status: StatusCode, body: &str) -> FetchError {
    let detail = format!("{symbol}: HTTP {status}: {}", body.chars().take(200).collect::<String>());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        FetchError::Transient(detail)
    } else {
        FetchError::NotFound(detail)
    }
}

#[async_trait]
impl PriceProvider for YahooClient {
    async fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries, FetchError> {
        debug!(symbol, lookback_days, "Fetching daily bars from Yahoo");
        let body = self.get_chart(symbol, lookback_days).await?;
        let series = parse_chart(symbol, &body)?;
        debug!(symbol, candles = series.len(), "Fetched daily bars");
        Ok(series)
    }
}
