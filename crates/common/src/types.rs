use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// One daily trading session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    fn check(&self) -> Result<(), AnalysisError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(AnalysisError::InvalidValue(format!(
                "non-finite price on {}",
                self.date
            )));
        }
        if self.high < self.open.max(self.close).max(self.low)
            || self.low > self.open.min(self.close).min(self.high)
        {
            return Err(AnalysisError::InvalidValue(format!(
                "high/low out of range on {}",
                self.date
            )));
        }
        Ok(())
    }
}

/// Candles ordered strictly ascending by date.
///
/// Construction validates ordering and the per-candle OHLC invariant, so every
/// `PriceSeries` the analysis stages see is well formed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    candles: Vec<Candle>,
}

impl PriceSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, AnalysisError> {
        for candle in &candles {
            candle.check()?;
        }
        if let Some(w) = candles.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(AnalysisError::InvalidValue(format!(
                "dates not strictly ascending: {} then {}",
                w[0].date, w[1].date
            )));
        }
        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.candles.iter().map(|c| c.close)
    }
}

/// An entry of the instrument universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub company_name: String,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: company_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// Why an instrument failed. Variant order is the order checks are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    DataError,
    NotUptrend,
    TooFarFromEma,
    NoRecentTouch,
    NotConsolidating,
}

impl FailureReason {
    pub const ALL: [FailureReason; 5] = [
        FailureReason::DataError,
        FailureReason::NotUptrend,
        FailureReason::TooFarFromEma,
        FailureReason::NoRecentTouch,
        FailureReason::NotConsolidating,
    ];
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::DataError => write!(f, "DATA_ERROR"),
            FailureReason::NotUptrend => write!(f, "NOT_UPTREND"),
            FailureReason::TooFarFromEma => write!(f, "TOO_FAR_FROM_EMA"),
            FailureReason::NoRecentTouch => write!(f, "NO_RECENT_TOUCH"),
            FailureReason::NotConsolidating => write!(f, "NOT_CONSOLIDATING"),
        }
    }
}

/// Outcome of screening one instrument. Built once by the verdict stage and
/// never modified afterwards.
///
/// Price and EMA metrics are `None` only on `DATA_ERROR` results, where there
/// was nothing to compute them from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub company_name: String,

    pub current_price: Option<f64>,
    pub ema_value: Option<f64>,
    pub distance_percent: Option<f64>,

    pub in_uptrend: bool,

    pub ema_touched: bool,
    pub touch_date: Option<NaiveDate>,
    pub touch_distance_percent: Option<f64>,

    pub is_consolidating: bool,
    pub volatility_ratio: Option<f64>,
    pub avg_distance_from_ema: Option<f64>,
    pub ema_rising: bool,

    pub verdict: Verdict,
    pub failure_reason: Option<FailureReason>,
    /// Detail of the underlying error for `DATA_ERROR` results.
    pub error: Option<String>,
}

impl AnalysisResult {
    /// A `DATA_ERROR` result with every metric absent.
    pub fn data_error(instrument: &Instrument, error: impl std::fmt::Display) -> Self {
        Self {
            symbol: instrument.symbol.clone(),
            company_name: instrument.company_name.clone(),
            current_price: None,
            ema_value: None,
            distance_percent: None,
            in_uptrend: false,
            ema_touched: false,
            touch_date: None,
            touch_distance_percent: None,
            is_consolidating: false,
            volatility_ratio: None,
            avg_distance_from_ema: None,
            ema_rising: false,
            verdict: Verdict::Fail,
            failure_reason: Some(FailureReason::DataError),
            error: Some(error.to_string()),
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Tally of one screening run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_analyzed: usize,
    pub passed: usize,
    pub failures: BTreeMap<FailureReason, usize>,
}

impl RunStatistics {
    pub fn failure_count(&self, reason: FailureReason) -> usize {
        self.failures.get(&reason).copied().unwrap_or(0)
    }

    pub fn failed(&self) -> usize {
        self.failures.values().sum()
    }
}
