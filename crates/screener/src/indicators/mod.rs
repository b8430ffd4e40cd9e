pub mod atr;
pub mod ema;

pub use atr::{average_true_range, true_range};
pub use ema::{compute_ema, EmaSeries};
