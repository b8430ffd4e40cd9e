pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{Config, ScreenerConfig};
pub use error::{AnalysisError, Error, FetchError, Result};
pub use provider::PriceProvider;
pub use types::*;
