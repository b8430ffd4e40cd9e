use chrono::NaiveDate;
use serde::Serialize;

use common::PriceSeries;

use crate::indicators::EmaSeries;

/// Most recent pullback to the EMA inside the lookback window, if any.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TouchResult {
    pub touched: bool,
    pub touch_date: Option<NaiveDate>,
    /// `(low - ema) / ema * 100` on the touch date.
    pub touch_distance_percent: Option<f64>,
}

/// Scan the last `lookback_days` candles, newest first, for a touch of the EMA.
///
/// A candle touches when its low is at or below `ema * (1 + tolerance)` or it
/// closed at or below the EMA. Candles with no EMA yet are skipped, and a
/// lookback longer than the history is clamped.
pub fn detect_touch(
    series: &PriceSeries,
    ema: &EmaSeries,
    lookback_days: usize,
    tolerance: f64,
) -> TouchResult {
    series
        .candles()
        .iter()
        .zip(ema.values())
        .rev()
        .take(lookback_days)
        .find_map(|(candle, ema)| {
            let ema = (*ema)?;
            let touched = candle.low <= ema * (1.0 + tolerance) || candle.close <= ema;
            touched.then(|| TouchResult {
                touched: true,
                touch_date: Some(candle.date),
                touch_distance_percent: Some((candle.low - ema) / ema * 100.0),
            })
        })
        .unwrap_or_default()
}
