//! EMA pullback screen: EMA, touch, consolidation and proximity checks, the
//! verdict that combines them, and the run-level ranking and tallies.

pub mod consolidation;
pub mod indicators;
pub mod proximity;
pub mod ranking;
pub mod stats;
pub mod touch;
pub mod verdict;

pub use consolidation::{analyze_consolidation, ConsolidationResult};
pub use indicators::{compute_ema, EmaSeries};
pub use proximity::{check_proximity, ProximityResult};
pub use ranking::{rank, RankedResults};
pub use stats::StatisticsCollector;
pub use touch::{detect_touch, TouchResult};
pub use verdict::{analyze, derive_verdict, run_checks, Checks, Stage};
