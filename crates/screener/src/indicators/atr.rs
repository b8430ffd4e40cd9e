//! True Range and a simple-mean Average True Range.
//!
//! `TR = max(high - low, |high - prevClose|, |low - prevClose|)`. Unlike
//! Wilder's smoothed ATR, the screener wants the plain mean over a short
//! trailing window.

use common::Candle;

pub fn true_range(prev_close: f64, candle: &Candle) -> f64 {
    let hl = candle.high - candle.low;
    let hc = (candle.high - prev_close).abs();
    let lc = (candle.low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Mean True Range of the last `window` candles of `candles`.
///
/// Returns `None` if `window` is zero or there are fewer than `window + 1`
/// candles (each TR needs the previous close).
pub fn average_true_range(candles: &[Candle], window: usize) -> Option<f64> {
    if window == 0 || candles.len() < window + 1 {
        return None;
    }
    let tail = &candles[candles.len() - window - 1..];
    let sum: f64 = tail
        .windows(2)
        .map(|pair| true_range(pair[0].close, &pair[1]))
        .sum();
    Some(sum / window as f64)
}
