use tracing::{debug, warn};

use common::{
    AnalysisError, AnalysisResult, FailureReason, Instrument, PriceSeries, ScreenerConfig, Verdict,
};

use crate::consolidation::{analyze_consolidation, ConsolidationResult};
use crate::indicators::compute_ema;
use crate::proximity::{check_proximity, ProximityResult};
use crate::touch::{detect_touch, TouchResult};

/// The checks an instrument goes through, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uptrend,
    Proximity,
    Touch,
    Consolidation,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::Uptrend,
        Stage::Proximity,
        Stage::Touch,
        Stage::Consolidation,
    ];

    pub fn failure_reason(self) -> FailureReason {
        match self {
            Stage::Uptrend => FailureReason::NotUptrend,
            Stage::Proximity => FailureReason::TooFarFromEma,
            Stage::Touch => FailureReason::NoRecentTouch,
            Stage::Consolidation => FailureReason::NotConsolidating,
        }
    }
}

/// Every metric for one instrument, computed before any verdict is taken.
#[derive(Debug, Clone, PartialEq)]
pub struct Checks {
    pub current_price: f64,
    pub ema_value: f64,
    pub in_uptrend: bool,
    pub proximity: ProximityResult,
    pub touch: TouchResult,
    pub consolidation: Result<ConsolidationResult, AnalysisError>,
}

impl Checks {
    fn passed(&self, stage: Stage) -> bool {
        match stage {
            Stage::Uptrend => self.in_uptrend,
            Stage::Proximity => self.proximity.passes,
            Stage::Touch => self.touch.touched,
            Stage::Consolidation => self
                .consolidation
                .as_ref()
                .is_ok_and(|c| c.is_consolidating),
        }
    }
}

/// Compute all metrics for `series`. Only an EMA failure stops early, since
/// nothing else can be measured without it.
pub fn run_checks(series: &PriceSeries, config: &ScreenerConfig) -> Result<Checks, AnalysisError> {
    let ema = compute_ema(series, config.ema_period)?;

    let (current_price, ema_value) = match (series.last(), ema.last()) {
        (Some(candle), Some(ema)) => (candle.close, ema),
        _ => {
            return Err(AnalysisError::InsufficientData {
                stage: "ema",
                required: config.ema_period.max(1),
                available: series.len(),
            })
        }
    };

    Ok(Checks {
        current_price,
        ema_value,
        in_uptrend: current_price > ema_value,
        proximity: check_proximity(current_price, ema_value, config.proximity_percentage),
        touch: detect_touch(series, &ema, config.lookback_days, config.touch_tolerance),
        consolidation: analyze_consolidation(
            series,
            &ema,
            config.consolidation_window,
            config.volatility_threshold,
            config.avg_distance_threshold,
        ),
    })
}

/// Reduce computed checks to a verdict: the first failing stage in
/// `Stage::ORDER` sets the reason. A consolidation data error only surfaces,
/// as `DATA_ERROR`, once every earlier stage has passed.
pub fn derive_verdict(checks: &Checks) -> (Verdict, Option<FailureReason>) {
    match Stage::ORDER.into_iter().find(|stage| !checks.passed(*stage)) {
        Some(Stage::Consolidation) if checks.consolidation.is_err() => {
            (Verdict::Fail, Some(FailureReason::DataError))
        }
        Some(stage) => (Verdict::Fail, Some(stage.failure_reason())),
        None => (Verdict::Pass, None),
    }
}

/// Screen one instrument. Never fails: data problems become a `DATA_ERROR`
/// result.
pub fn analyze(
    instrument: &Instrument,
    series: &PriceSeries,
    config: &ScreenerConfig,
) -> AnalysisResult {
    let checks = match run_checks(series, config) {
        Ok(checks) => checks,
        Err(e) => {
            warn!(symbol = %instrument.symbol, error = %e, "EMA unavailable");
            return AnalysisResult::data_error(instrument, e);
        }
    };

    let (verdict, failure_reason) = derive_verdict(&checks);
    match failure_reason {
        Some(reason) => debug!(symbol = %instrument.symbol, %reason, "Failed screen"),
        None => debug!(symbol = %instrument.symbol, "Passed all criteria"),
    }

    let consolidation = checks.consolidation.as_ref().ok();
    AnalysisResult {
        symbol: instrument.symbol.clone(),
        company_name: instrument.company_name.clone(),
        current_price: Some(checks.current_price),
        ema_value: Some(checks.ema_value),
        distance_percent: Some(checks.proximity.distance_percent),
        in_uptrend: checks.in_uptrend,
        ema_touched: checks.touch.touched,
        touch_date: checks.touch.touch_date,
        touch_distance_percent: checks.touch.touch_distance_percent,
        is_consolidating: consolidation.is_some_and(|c| c.is_consolidating),
        volatility_ratio: consolidation.map(|c| c.volatility_ratio),
        avg_distance_from_ema: consolidation.map(|c| c.avg_distance_from_ema),
        ema_rising: consolidation.is_some_and(|c| c.ema_rising),
        verdict,
        failure_reason,
        error: checks.consolidation.as_ref().err().map(ToString::to_string),
    }
}
