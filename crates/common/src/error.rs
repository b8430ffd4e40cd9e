use thiserror::Error;

/// Failures of the pure analysis stages. Both collapse into a `DATA_ERROR`
/// verdict for the affected instrument.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient data for {stage}: need {required} candles, have {available}")]
    InsufficientData {
        stage: &'static str,
        required: usize,
        available: usize,
    },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Failures reported by a price-series provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("symbol not found: {0}")]
    NotFound(String),

    #[error("insufficient history: {0}")]
    InsufficientData(String),

    /// Worth retrying: network trouble, rate limiting, server errors.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Fetch failed after {attempts} attempt(s): {source}")]
    FetchFailure {
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
