use serde::Serialize;

use common::{AnalysisError, PriceSeries};

use crate::indicators::{average_true_range, EmaSeries};

/// Whether price is basing quietly above a rising EMA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsolidationResult {
    pub is_consolidating: bool,
    /// ATR over the window divided by the latest close.
    pub volatility_ratio: f64,
    /// Mean of `|close - ema| / ema` over the window.
    pub avg_distance_from_ema: f64,
    /// EMA now strictly above its value `window_days` candles ago.
    pub ema_rising: bool,
}

/// Assess the trailing `window_days` candles.
///
/// Needs `window_days + 1` candles (True Range uses the previous close) and a
/// defined EMA on every candle in the window; otherwise `InsufficientData`.
/// Too little history for the EMA slope comparison is not an error, it simply
/// reads as not rising.
pub fn analyze_consolidation(
    series: &PriceSeries,
    ema: &EmaSeries,
    window_days: usize,
    volatility_threshold: f64,
    avg_distance_threshold: f64,
) -> Result<ConsolidationResult, AnalysisError> {
    let n = series.len();
    if ema.len() != n {
        return Err(AnalysisError::InvalidValue(format!(
            "EMA has {} values for {n} candles",
            ema.len()
        )));
    }

    let required = match ema.seed_index() {
        Some(seed) => (window_days + 1).max(seed + window_days),
        None => n.max(window_days) + 1,
    };
    if window_days == 0 || n < required {
        return Err(AnalysisError::InsufficientData {
            stage: "consolidation",
            required: required.max(2),
            available: n,
        });
    }

    let candles = series.candles();
    let last = n - 1;
    let start = n - window_days;
    let current_price = candles[last].close;
    if current_price <= 0.0 {
        return Err(AnalysisError::InvalidValue(format!(
            "non-positive price {current_price}"
        )));
    }

    let atr = average_true_range(candles, window_days).ok_or(AnalysisError::InsufficientData {
        stage: "consolidation",
        required: window_days + 1,
        available: n,
    })?;
    let volatility_ratio = atr / current_price;

    let mut distance_sum = 0.0;
    for (i, candle) in candles.iter().enumerate().skip(start) {
        // defined for every i >= seed, checked above
        let value = ema
            .get(i)
            .ok_or_else(|| AnalysisError::InvalidValue(format!("EMA missing at index {i}")))?;
        distance_sum += (candle.close - value).abs() / value;
    }
    let avg_distance_from_ema = distance_sum / window_days as f64;

    let ema_rising = match (ema.get(last), ema.get(last - window_days)) {
        (Some(now), Some(then)) => now > then,
        _ => false,
    };

    let is_consolidating = volatility_ratio < volatility_threshold
        && avg_distance_from_ema < avg_distance_threshold
        && ema_rising;

    Ok(ConsolidationResult {
        is_consolidating,
        volatility_ratio,
        avg_distance_from_ema,
        ema_rising,
    })
}
