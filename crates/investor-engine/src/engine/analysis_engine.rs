//! Value analysis pipeline

use chrono::Utc;
use investor_llm::LLMProvider;
use investor_llm::providers::OpenAIProvider;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::result::AnalysisReport;
use crate::api::{MarketDataProvider, YahooMarketData};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::request::AnalysisRequest;
use crate::scorer::QualitativeScorer;
use crate::scoring::combine;
use crate::technical::TechnicalSignalEngine;

/// Runs one analysis per request
///
/// Holds no per-request state; a single analyzer can serve concurrent
/// requests.
pub struct ValueAnalyzer {
    market_data: Arc<dyn MarketDataProvider>,
    scorer: QualitativeScorer,
    technical: TechnicalSignalEngine,
    config: AnalysisConfig,
}

impl ValueAnalyzer {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        llm: Arc<dyn LLMProvider>,
        config: AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;
        let scorer = QualitativeScorer::new(llm, &config)?;
        let technical = TechnicalSignalEngine::new(config.technical)?;

        Ok(Self {
            market_data,
            scorer,
            technical,
            config,
        })
    }

    /// Yahoo market data and the OpenAI-compatible provider from the environment
    pub fn from_env(config: AnalysisConfig) -> Result<Self> {
        let market_data = Arc::new(YahooMarketData::new(config.history_years)?);
        let llm = Arc::new(OpenAIProvider::from_env()?);
        Self::new(market_data, llm, config)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one ticker
    ///
    /// Fails only when the symbol is invalid or the market data cannot be
    /// fetched. Short histories and failed topic calls still yield a report.
    #[instrument(skip(self, request), fields(request_id = %request.id, ticker = %request.ticker))]
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let symbol = request.symbol()?;
        let snapshot = self.market_data.fetch_snapshot(&symbol).await?;

        let pe_ratio = snapshot.pe_ratio();
        let valuation = self
            .config
            .valuation_policy
            .evaluate(pe_ratio, snapshot.historical_pe_range());

        let technical = self.technical.analyze(&snapshot.history);
        let qualitative = self.scorer.score(&snapshot).await;
        let final_result = combine(
            qualitative.total,
            valuation.multiplier,
            &self.config.verdict_bands,
        );

        if let Some(err) = &snapshot.fundamentals_error {
            warn!(symbol = %symbol, error = %err, "valuing without fundamentals");
        }

        info!(
            symbol = %symbol,
            policy = %valuation.policy,
            multiplier = valuation.multiplier,
            qualitative = qualitative.total,
            score = final_result.final_score,
            verdict = %final_result.verdict,
            trend = %technical.trend(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            request: request.clone(),
            symbol,
            fallback_used: qualitative.used_fallback(),
            fundamentals_unavailable: snapshot.fundamentals_error.is_some(),
            profile: snapshot.profile,
            price: snapshot.price,
            pe_ratio,
            valuation,
            qualitative,
            technical,
            final_result,
            generated_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for ValueAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueAnalyzer")
            .field("scorer", &self.scorer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
