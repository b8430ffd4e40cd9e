use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Parameters of the analysis pipeline. Threaded by reference into every stage.
///
/// Can be loaded from a TOML file; missing keys keep their defaults:
/// ```toml
/// ema_period = 10
/// lookback_days = 7
/// touch_tolerance = 0.05
/// proximity_percentage = 10.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    /// EMA smoothing window.
    pub ema_period: usize,
    /// History requested from the provider, in trading days.
    pub data_days: u32,
    /// Candles examined for an EMA touch, newest first.
    pub lookback_days: usize,
    /// Fractional tolerance for a low that comes near the EMA (0.05 = 5%).
    pub touch_tolerance: f64,
    /// Trailing window for ATR, average distance and EMA slope.
    pub consolidation_window: usize,
    /// Max ATR / price ratio to count as consolidating.
    pub volatility_threshold: f64,
    /// Max mean |close - ema| / ema over the window.
    pub avg_distance_threshold: f64,
    /// Max distance above the EMA, in percent. Exclusive.
    pub proximity_percentage: f64,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            ema_period: 10,
            data_days: 60,
            lookback_days: 7,
            touch_tolerance: 0.05,
            consolidation_window: 10,
            volatility_threshold: 0.05,
            avg_distance_threshold: 0.15,
            proximity_percentage: 10.0,
        }
    }
}

impl ScreenerConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read '{}': {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse '{}': {e}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        if self.ema_period == 0 {
            return Err(Error::Config("EMA_PERIOD must be at least 1".into()));
        }
        if self.consolidation_window == 0 {
            return Err(Error::Config("CONSOLIDATION_WINDOW must be at least 1".into()));
        }
        let fractions = [
            ("EMA_TOUCH_TOLERANCE", self.touch_tolerance),
            ("CONSOLIDATION_VOLATILITY_THRESHOLD", self.volatility_threshold),
            ("CONSOLIDATION_DISTANCE_THRESHOLD", self.avg_distance_threshold),
            ("PROXIMITY_PERCENTAGE", self.proximity_percentage),
        ];
        for (name, value) in fractions {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything a screening run needs, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub screener: ScreenerConfig,

    // Provider
    pub api_delay: Duration,
    pub fetch_max_attempts: u32,
    pub fetch_backoff: Duration,
    pub yahoo_base_url: String,
    pub concurrency: usize,

    // Input / output
    pub universe_path: PathBuf,
    pub symbol_suffix: String,
    pub output_path: PathBuf,
    pub debug_output_path: PathBuf,
    pub preview_rows: usize,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screener: ScreenerConfig::default(),
            api_delay: Duration::from_millis(500),
            fetch_max_attempts: 3,
            fetch_backoff: Duration::from_millis(1000),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            concurrency: 4,
            universe_path: PathBuf::from("Futures Stocks List.csv"),
            symbol_suffix: ".NS".to_string(),
            output_path: PathBuf::from("ema_screener_results.csv"),
            debug_output_path: PathBuf::from("ema_screener_debug.csv"),
            preview_rows: 10,
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present. Every variable is optional.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Precedence: env over the
    /// `SCREENER_CONFIG` TOML file over defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Config::default();

        let base = match env.get("SCREENER_CONFIG") {
            Some(path) => ScreenerConfig::load(Path::new(&path))?,
            None => ScreenerConfig::default(),
        };

        let screener = ScreenerConfig {
            ema_period: env.parse_or("EMA_PERIOD", base.ema_period),
            data_days: env.parse_or("DATA_DAYS", base.data_days),
            lookback_days: env.parse_or("LOOKBACK_DAYS", base.lookback_days),
            touch_tolerance: env.parse_or("EMA_TOUCH_TOLERANCE", base.touch_tolerance),
            consolidation_window: env.parse_or("CONSOLIDATION_WINDOW", base.consolidation_window),
            volatility_threshold: env
                .parse_or("CONSOLIDATION_VOLATILITY_THRESHOLD", base.volatility_threshold),
            avg_distance_threshold: env
                .parse_or("CONSOLIDATION_DISTANCE_THRESHOLD", base.avg_distance_threshold),
            proximity_percentage: env.parse_or("PROXIMITY_PERCENTAGE", base.proximity_percentage),
        };
        screener.validate()?;

        let api_delay_secs: f64 = env.parse_or("API_DELAY", defaults.api_delay.as_secs_f64());
        let api_delay = Duration::try_from_secs_f64(api_delay_secs)
            .map_err(|_| Error::Config(format!("API_DELAY must be >= 0, got {api_delay_secs}")))?;

        let config = Config {
            screener,
            api_delay,
            fetch_max_attempts: env.parse_or("FETCH_MAX_ATTEMPTS", defaults.fetch_max_attempts),
            fetch_backoff: Duration::from_millis(
                env.parse_or("FETCH_BACKOFF_MS", defaults.fetch_backoff.as_millis() as u64),
            ),
            yahoo_base_url: env.get("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            concurrency: env.parse_or("CONCURRENCY", defaults.concurrency),
            universe_path: env
                .get("UNIVERSE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.universe_path),
            symbol_suffix: env.get("SYMBOL_SUFFIX").unwrap_or(defaults.symbol_suffix),
            output_path: env
                .get("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
            debug_output_path: env
                .get("DEBUG_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.debug_output_path),
            preview_rows: env.parse_or("PREVIEW_ROWS", defaults.preview_rows),
            debug: env.flag_or("DEBUG", defaults.debug),
        };

        if config.concurrency == 0 {
            return Err(Error::Config("CONCURRENCY must be at least 1".into()));
        }
        if config.fetch_max_attempts == 0 {
            return Err(Error::Config("FETCH_MAX_ATTEMPTS must be at least 1".into()));
        }
        Ok(config)
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + std::fmt::Debug,
    {
        match self.get(key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, ?default, "Unparsable config value, using default");
                default
            }),
            None => default,
        }
    }

    fn flag_or(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(|v| v.to_lowercase()) {
            Some(v) => match v.as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    warn!(key, value = %v, default, "Unparsable flag, using default");
                    default
                }
            },
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = from_pairs(&[]).unwrap();
        assert_eq!(cfg.screener, ScreenerConfig::default());
        assert_eq!(cfg.screener.ema_period, 10);
        assert_eq!(cfg.screener.lookback_days, 7);
        assert_eq!(cfg.api_delay, Duration::from_millis(500));
        assert!(!cfg.debug);
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = from_pairs(&[
            ("EMA_PERIOD", "20"),
            ("PROXIMITY_PERCENTAGE", "7.5"),
            ("API_DELAY", "0.25"),
            ("DEBUG", "TRUE"),
            ("UNIVERSE_PATH", "universe.csv"),
        ])
        .unwrap();
        assert_eq!(cfg.screener.ema_period, 20);
        assert_eq!(cfg.screener.proximity_percentage, 7.5);
        assert_eq!(cfg.api_delay, Duration::from_millis(250));
        assert!(cfg.debug);
        assert_eq!(cfg.universe_path, PathBuf::from("universe.csv"));
    }

    #[test]
    fn unparsable_value_falls_back_to_default() {
        let cfg = from_pairs(&[("LOOKBACK_DAYS", "seven")]).unwrap();
        assert_eq!(cfg.screener.lookback_days, 7);
    }

    #[test]
    fn zero_ema_period_is_rejected() {
        assert!(matches!(
            from_pairs(&[("EMA_PERIOD", "0")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn negative_api_delay_is_rejected() {
        assert!(from_pairs(&[("API_DELAY", "-1")]).is_err());
    }

    #[test]
    fn toml_file_is_overridden_by_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ema_period = 12\nlookback_days = 4").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cfg = from_pairs(&[("SCREENER_CONFIG", &path), ("LOOKBACK_DAYS", "5")]).unwrap();
        assert_eq!(cfg.screener.ema_period, 12);
        assert_eq!(cfg.screener.lookback_days, 5);
        // untouched keys keep defaults
        assert_eq!(cfg.screener.touch_tolerance, 0.05);
    }

    #[test]
    fn missing_toml_file_is_a_config_error() {
        let result = from_pairs(&[("SCREENER_CONFIG", "/nonexistent/screener.toml")]);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
