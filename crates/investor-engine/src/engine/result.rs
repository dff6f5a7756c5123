//! Analysis report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::qualitative::QualitativeSummary;
use crate::request::AnalysisRequest;
use crate::scoring::FinalResult;
use crate::snapshot::CompanyProfile;
use crate::technical::TechnicalOutcome;
use crate::valuation::ValuationResult;

/// Everything the presentation layer needs for one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub request: AnalysisRequest,
    /// Provider symbol the request resolved to
    pub symbol: String,
    pub profile: CompanyProfile,
    pub price: f64,
    pub pe_ratio: Option<f64>,
    pub valuation: ValuationResult,
    pub qualitative: QualitativeSummary,
    pub technical: TechnicalOutcome,
    #[serde(rename = "final")]
    pub final_result: FinalResult,
    /// The backup model was tried for at least one topic
    pub fallback_used: bool,
    /// The quote summary lookup failed, so valuation ran without EPS
    pub fundamentals_unavailable: bool,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// One-line verdict, e.g. `NVDA: HOLD (72.0/100)`
    pub fn headline(&self) -> String {
        format!(
            "{}: {} ({:.1}/100)",
            self.symbol, self.final_result.verdict, self.final_result.final_score
        )
    }
}
