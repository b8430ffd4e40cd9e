use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use common::{AnalysisResult, Candle, FailureReason, Instrument, PriceSeries, ScreenerConfig, Verdict};
use screener::{analyze, compute_ema, rank, StatisticsCollector};

fn series_from_closes(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            date: start + Days::new(i as u64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000.0,
        })
        .collect();
    PriceSeries::new(candles).unwrap()
}

/// Random walk of positive closes.
fn closes_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (1.0f64..10_000.0, prop::collection::vec(-0.05f64..0.05, min_len..max_len)).prop_map(
        |(start, steps)| {
            let mut price = start;
            steps
                .into_iter()
                .map(|step| {
                    price *= 1.0 + step;
                    price
                })
                .collect()
        },
    )
}

proptest! {
    /// EMA output is index-aligned with its input and defined from the seed on.
    #[test]
    fn ema_length_matches_series(closes in closes_strategy(1, 80), period in 1usize..20) {
        let series = series_from_closes(&closes);
        match compute_ema(&series, period) {
            Ok(ema) => {
                prop_assert!(closes.len() >= period);
                prop_assert_eq!(ema.len(), closes.len());
                prop_assert_eq!(ema.seed_index(), Some(period - 1));
                prop_assert!(ema.values()[period - 1..].iter().all(|v| v.is_some()));
            }
            Err(_) => prop_assert!(closes.len() < period),
        }
    }

    /// A constant series has an EMA equal to that constant everywhere.
    #[test]
    fn ema_of_constant_is_constant(price in 0.01f64..1_000_000.0, len in 10usize..60) {
        let ema = compute_ema(&series_from_closes(&vec![price; len]), 10).unwrap();
        for value in ema.values().iter().flatten() {
            prop_assert!((value - price).abs() <= price * 1e-12);
        }
    }

    /// The EMA never leaves the range of the closes it averages.
    #[test]
    fn ema_stays_within_close_range(closes in closes_strategy(10, 80)) {
        let ema = compute_ema(&series_from_closes(&closes), 10).unwrap();
        let lo = closes.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for value in ema.values().iter().flatten() {
            prop_assert!(*value >= lo * (1.0 - 1e-12) && *value <= hi * (1.0 + 1e-12));
        }
    }

    /// Screening never panics and the verdict agrees with the reported flags.
    #[test]
    fn verdict_is_consistent_with_metrics(closes in closes_strategy(1, 80)) {
        let series = series_from_closes(&closes);
        let result = analyze(&Instrument::new("RND", "Random Walk"), &series, &ScreenerConfig::default());

        match result.failure_reason {
            None => {
                prop_assert_eq!(result.verdict, Verdict::Pass);
                prop_assert!(result.in_uptrend && result.ema_touched && result.is_consolidating);
                let distance = result.distance_percent.unwrap();
                prop_assert!(distance > 0.0 && distance < 10.0);
            }
            Some(FailureReason::NotUptrend) => prop_assert!(!result.in_uptrend),
            Some(FailureReason::TooFarFromEma) => prop_assert!(result.in_uptrend),
            Some(FailureReason::NoRecentTouch) => prop_assert!(!result.ema_touched),
            Some(FailureReason::NotConsolidating) => prop_assert!(!result.is_consolidating),
            Some(FailureReason::DataError) => prop_assert!(result.error.is_some()),
        }
    }

    /// passed + sum of failure counts == number of instruments, and ranking
    /// keeps exactly the passed ones.
    #[test]
    fn statistics_are_conserved(outcomes in prop::collection::vec(0usize..6, 0..200)) {
        let results: Vec<AnalysisResult> = outcomes
            .iter()
            .enumerate()
            .map(|(i, &o)| {
                let mut r = AnalysisResult::data_error(&Instrument::new(format!("S{i}"), "Co"), "x");
                r.distance_percent = Some(i as f64 * 0.01);
                if o == 5 {
                    r.verdict = Verdict::Pass;
                    r.failure_reason = None;
                } else {
                    r.failure_reason = Some(FailureReason::ALL[o]);
                }
                r
            })
            .collect();

        let mut collector = StatisticsCollector::new();
        collector.extend(&results);
        let stats = collector.summary();

        prop_assert_eq!(stats.total_analyzed, results.len());
        prop_assert_eq!(stats.passed + stats.failed(), results.len());
        prop_assert_eq!(rank(&results).len(), stats.passed);
    }
}
