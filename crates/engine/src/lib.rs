pub mod pacer;
pub mod report;
pub mod retry;
pub mod runner;
pub mod universe;
pub mod yahoo;

pub use pacer::Pacer;
pub use report::{
    format_summary, print_summary, write_debug, write_debug_csv, write_results, write_results_csv,
};
pub use retry::{fetch_with_retry, RetryPolicy};
pub use runner::{BatchRunner, ScreenReport};
pub use universe::{derive_symbol, read_universe, read_universe_from};
pub use yahoo::{YahooClient, DEFAULT_BASE_URL};
