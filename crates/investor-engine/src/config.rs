//! Configuration for value analysis runs

use investor_utils::{env_flag, env_parse, env_var};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::scoring::VerdictBands;
use crate::technical::TechnicalParams;
use crate::valuation::ValuationPolicy;

pub const DEFAULT_PRIMARY_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_BACKUP_MODEL: &str = "llama-3.1-8b-instant";

/// Configuration for one [`ValueAnalyzer`](crate::engine::ValueAnalyzer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// How the PE ratio maps to a multiplier
    pub valuation_policy: ValuationPolicy,

    /// Final score thresholds
    pub verdict_bands: VerdictBands,

    /// Model asked first for every topic
    pub primary_model: String,

    /// Model asked once when the primary call fails
    pub backup_model: String,

    pub temperature: f32,

    /// Upper bound on a topic answer
    pub max_tokens: u32,

    /// Score the five topics concurrently
    pub parallel_topics: bool,

    /// Shared budget for topic calls
    pub llm_requests_per_minute: u32,

    /// Price history lookback
    pub history_years: u32,

    pub technical: TechnicalParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            valuation_policy: ValuationPolicy::default(),
            verdict_bands: VerdictBands::standard(),
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            backup_model: DEFAULT_BACKUP_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 100,
            parallel_topics: false,
            llm_requests_per_minute: 30,
            history_years: 5,
            technical: TechnicalParams::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Apply `INVESTOR_*` environment overrides
    pub fn with_env(mut self) -> Result<Self> {
        if let Some(model) = env_var("INVESTOR_PRIMARY_MODEL") {
            self.primary_model = model;
        }
        if let Some(model) = env_var("INVESTOR_BACKUP_MODEL") {
            self.backup_model = model;
        }
        if let Some(policy) = env_var("INVESTOR_VALUATION_POLICY") {
            self.valuation_policy = policy.parse().map_err(AnalysisError::Config)?;
        }
        if let Some(parallel) = env_flag("INVESTOR_PARALLEL_TOPICS") {
            self.parallel_topics = parallel;
        }
        if let Some(years) = env_parse("INVESTOR_HISTORY_YEARS") {
            self.history_years = years;
        }
        if let Some(rpm) = env_parse("INVESTOR_LLM_RPM") {
            self.llm_requests_per_minute = rpm;
        }
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.primary_model.trim().is_empty() || self.backup_model.trim().is_empty() {
            return Err(AnalysisError::Config(
                "model names must not be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AnalysisError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(AnalysisError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm_requests_per_minute == 0 {
            return Err(AnalysisError::Config(
                "llm_requests_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.history_years == 0 {
            return Err(AnalysisError::Config(
                "history_years must be greater than 0".to_string(),
            ));
        }

        self.technical.validate()
    }
}

/// Builder for AnalysisConfig
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    valuation_policy: Option<ValuationPolicy>,
    verdict_bands: Option<VerdictBands>,
    primary_model: Option<String>,
    backup_model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    parallel_topics: Option<bool>,
    llm_requests_per_minute: Option<u32>,
    history_years: Option<u32>,
    technical: Option<TechnicalParams>,
}

impl AnalysisConfigBuilder {
    pub fn valuation_policy(mut self, policy: ValuationPolicy) -> Self {
        self.valuation_policy = Some(policy);
        self
    }

    pub fn verdict_bands(mut self, bands: VerdictBands) -> Self {
        self.verdict_bands = Some(bands);
        self
    }

    pub fn primary_model(mut self, model: impl Into<String>) -> Self {
        self.primary_model = Some(model.into());
        self
    }

    pub fn backup_model(mut self, model: impl Into<String>) -> Self {
        self.backup_model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn parallel_topics(mut self, parallel: bool) -> Self {
        self.parallel_topics = Some(parallel);
        self
    }

    pub fn llm_requests_per_minute(mut self, limit: u32) -> Self {
        self.llm_requests_per_minute = Some(limit);
        self
    }

    pub fn history_years(mut self, years: u32) -> Self {
        self.history_years = Some(years);
        self
    }

    pub fn technical(mut self, params: TechnicalParams) -> Self {
        self.technical = Some(params);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnalysisConfig> {
        let defaults = AnalysisConfig::default();

        let config = AnalysisConfig {
            valuation_policy: self.valuation_policy.unwrap_or(defaults.valuation_policy),
            verdict_bands: self.verdict_bands.unwrap_or(defaults.verdict_bands),
            primary_model: self.primary_model.unwrap_or(defaults.primary_model),
            backup_model: self.backup_model.unwrap_or(defaults.backup_model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            parallel_topics: self.parallel_topics.unwrap_or(defaults.parallel_topics),
            llm_requests_per_minute: self
                .llm_requests_per_minute
                .unwrap_or(defaults.llm_requests_per_minute),
            history_years: self.history_years.unwrap_or(defaults.history_years),
            technical: self.technical.unwrap_or(defaults.technical),
        };

        config.validate()?;
        Ok(config)
    }
}
