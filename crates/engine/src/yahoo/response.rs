use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use common::{Candle, FetchError, PriceSeries};

// ─── Chart API response types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResult {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Meta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

/// Turn a chart API body into a validated daily series.
///
/// Rows with any missing OHLC field are dropped; when two rows land on the same
/// exchange-local date the later one wins.
pub(crate) fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries, FetchError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(format!("{symbol}: {e}")))?;

    if let Some(err) = envelope.chart.error {
        return Err(chart_error(symbol, err));
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut r| (!r.is_empty()).then(|| r.swap_remove(0)))
        .ok_or_else(|| FetchError::NotFound(symbol.to_string()))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    let mut by_date: BTreeMap<NaiveDate, Candle> = BTreeMap::new();
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
        ) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        by_date.insert(
            date,
            Candle {
                date,
                open,
                high,
                low,
                close,
                volume: value_at(&quote.volume, i).unwrap_or(0.0),
            },
        );
    }

    if by_date.is_empty() {
        return Err(FetchError::InsufficientData(format!(
            "{symbol}: no complete daily bars"
        )));
    }

    PriceSeries::new(by_date.into_values().collect())
        .map_err(|e| FetchError::Malformed(format!("{symbol}: {e}")))
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn chart_error(symbol: &str, err: ChartError) -> FetchError {
    let detail = format!("{symbol}: {} ({})", err.description, err.code);
    if err.code.eq_ignore_ascii_case("not found") {
        FetchError::NotFound(detail)
    } else {
        FetchError::Transient(detail)
    }
}
