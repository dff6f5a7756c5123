//! Analysis orchestration
//!
//! Ties market data, valuation, technical signals and qualitative scoring
//! together into one [`AnalysisReport`] per request.

pub mod analysis_engine;
pub mod result;

pub use analysis_engine::ValueAnalyzer;
pub use result::AnalysisReport;
