use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProximityResult {
    /// `(price - ema) / ema * 100`
    pub distance_percent: f64,
    /// Strictly above the EMA and strictly below `max_percent`.
    pub passes: bool,
}

pub fn check_proximity(price: f64, ema: f64, max_percent: f64) -> ProximityResult {
    let distance_percent = (price - ema) / ema * 100.0;
    ProximityResult {
        distance_percent,
        passes: distance_percent > 0.0 && distance_percent < max_percent,
    }
}
