//! Value-investing scorecard engine
//!
//! Scores a single ticker by combining:
//!
//! - a valuation multiplier (1–5) derived from the PE ratio under an
//!   explicitly selected [`ValuationPolicy`]
//! - five business-quality topics, each rated 0–4 by an LLM
//! - a technical signal built from moving averages, RSI, volume, support and
//!   resistance and a volatility squeeze
//!
//! The qualitative total times the multiplier gives a score out of 100,
//! which is mapped to a [`Verdict`] through a configurable band table.
//!
//! # Example
//!
//! ```rust,ignore
//! use investor_engine::{AnalysisConfig, AnalysisRequest, Market, ValueAnalyzer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let analyzer = ValueAnalyzer::from_env(AnalysisConfig::default().with_env()?)?;
//!     let report = analyzer.analyze(&AnalysisRequest::new("NVDA", Market::Us)).await?;
//!     println!("{}", report.headline());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod prompts;
pub mod qualitative;
pub mod request;
pub mod scorer;
pub mod scoring;
pub mod snapshot;
pub mod technical;
pub mod valuation;

pub use api::{MarketDataProvider, YahooMarketData};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use engine::{AnalysisReport, ValueAnalyzer};
pub use error::{AnalysisError, Result};
pub use prompts::TopicPrompt;
pub use qualitative::{
    QualitativeSummary, Topic, TopicParse, TopicScore, aggregate, parse_topic_response,
};
pub use request::{AnalysisRequest, Market};
pub use scorer::QualitativeScorer;
pub use scoring::{FinalResult, Verdict, VerdictBand, VerdictBands, combine};
pub use snapshot::{Bar, CompanyProfile, StockSnapshot};
pub use technical::{
    Action, LevelWindow, TechnicalOutcome, TechnicalParams, TechnicalResult,
    TechnicalSignalEngine, Trend,
};
pub use valuation::{PeRange, StatusBand, ValuationPolicy, ValuationResult};
