//! Error types for analysis operations
//!
//! Only failures that abort a whole analysis live here. A topic response
//! that cannot be parsed and a price history that is too short for
//! technical analysis are ordinary outcomes, see
//! [`TopicParse`](crate::qualitative::TopicParse) and
//! [`TechnicalOutcome`](crate::technical::TechnicalOutcome).

use thiserror::Error;

/// Analysis specific errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Market data provider failed
    #[error("Market data error: {0}")]
    MarketData(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] investor_llm::LLMError),

    /// Prompt template error
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Technical indicator setup error
    #[error("Technical indicator error: {0}")]
    Indicator(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl AnalysisError {
    /// Whether this error means the ticker could not be resolved at all
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. } | Self::InvalidSymbol(_))
    }
}

impl From<yahoo_finance_api::YahooError> for AnalysisError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::MarketData(err.to_string())
    }
}

impl From<minijinja::Error> for AnalysisError {
    fn from(err: minijinja::Error) -> Self {
        Self::Prompt(err.to_string())
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
