//! Exponential Moving Average (EMA) over daily closes.
//!
//! Seeded with the simple average of the first `period` closes, then
//! `ema[i] = (close[i] - ema[i-1]) * k + ema[i-1]` with `k = 2 / (period + 1)`.

use common::{AnalysisError, PriceSeries};

/// EMA values index-aligned with the `PriceSeries` they came from.
/// Entries before the seed index are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmaSeries {
    values: Vec<Option<f64>>,
}

impl EmaSeries {
    pub fn from_values(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first defined value.
    pub fn seed_index(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

/// Compute the EMA series of `series` closes.
///
/// Fails with `InsufficientData` when there are fewer than `period` candles and
/// with `InvalidValue` when a close is non-finite or the EMA would be zero or
/// non-finite anywhere.
pub fn compute_ema(series: &PriceSeries, period: usize) -> Result<EmaSeries, AnalysisError> {
    if period == 0 || series.len() < period {
        return Err(AnalysisError::InsufficientData {
            stage: "ema",
            required: period.max(1),
            available: series.len(),
        });
    }

    let closes: Vec<f64> = series.closes().collect();
    if let Some(pos) = closes.iter().position(|c| !c.is_finite()) {
        return Err(AnalysisError::InvalidValue(format!(
            "non-finite close at index {pos}"
        )));
    }

    let seed = closes[..period].iter().sum::<f64>() / period as f64;
    if seed == 0.0 || !seed.is_finite() {
        return Err(AnalysisError::InvalidValue(format!(
            "degenerate EMA seed {seed}"
        )));
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(closes.len());
    values.resize(period - 1, None);
    values.push(Some(seed));

    let mut prev = seed;
    for (i, &close) in closes.iter().enumerate().skip(period) {
        let ema = (close - prev) * multiplier + prev;
        if ema == 0.0 || !ema.is_finite() {
            return Err(AnalysisError::InvalidValue(format!(
                "degenerate EMA {ema} at index {i}"
            )));
        }
        values.push(Some(ema));
        prev = ema;
    }

    Ok(EmaSeries { values })
}
