//! LLM-backed qualitative scorer

use futures::future::join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use investor_llm::{CompletionRequest, LLMProvider, Message, complete_with_fallback};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::prompts::TopicPrompt;
use crate::qualitative::{QualitativeSummary, Topic, TopicScore};
use crate::snapshot::StockSnapshot;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Scores the five business-quality topics of a snapshot
///
/// Every topic is scored independently: a failed or malformed answer zeroes
/// that topic and nothing else. All calls share one rate limiter.
pub struct QualitativeScorer {
    provider: Arc<dyn LLMProvider>,
    prompt: TopicPrompt,
    primary_model: String,
    backup_model: String,
    temperature: f32,
    max_tokens: usize,
    parallel: bool,
    rate_limiter: SharedRateLimiter,
}

impl QualitativeScorer {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.llm_requests_per_minute).ok_or_else(|| {
            AnalysisError::Config("llm_requests_per_minute must be greater than 0".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            provider,
            prompt: TopicPrompt::default(),
            primary_model: config.primary_model.clone(),
            backup_model: config.backup_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens as usize,
            parallel: config.parallel_topics,
            rate_limiter,
        })
    }

    /// Replace the default topic prompt
    pub fn with_prompt(mut self, prompt: TopicPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    /// Score all topics in [`Topic::ALL`] order
    #[instrument(skip(self, snapshot), fields(symbol = %snapshot.symbol, parallel = self.parallel))]
    pub async fn score(&self, snapshot: &StockSnapshot) -> QualitativeSummary {
        let topics = if self.parallel {
            join_all(Topic::ALL.map(|topic| self.score_topic(snapshot, topic))).await
        } else {
            let mut topics = Vec::with_capacity(Topic::ALL.len());
            for topic in Topic::ALL {
                topics.push(self.score_topic(snapshot, topic).await);
            }
            topics
        };

        QualitativeSummary::from_topic_scores(topics)
    }

    async fn score_topic(&self, snapshot: &StockSnapshot, topic: Topic) -> TopicScore {
        let prompt = match self.prompt.render(snapshot, topic) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(topic = %topic, error = %err, "failed to render topic prompt");
                return TopicScore::unavailable(topic, false);
            }
        };

        let request = CompletionRequest::builder(&self.primary_model)
            .add_message(Message::user(prompt))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        self.rate_limiter.until_ready().await;

        match complete_with_fallback(self.provider.as_ref(), request, &self.backup_model).await {
            Ok(answer) => {
                let score = TopicScore::from_response(topic, answer.text(), answer.used_fallback);
                debug!(topic = %topic, score = score.score, model = %answer.model, "topic scored");
                score
            }
            Err(err) => {
                warn!(topic = %topic, error = %err, "topic scoring unavailable");
                TopicScore::unavailable(topic, err.used_fallback)
            }
        }
    }
}

impl std::fmt::Debug for QualitativeScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualitativeScorer")
            .field("provider", &self.provider.name())
            .field("primary_model", &self.primary_model)
            .field("backup_model", &self.backup_model)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::{MockLlm, prompt_of, reply};
    use super::*;
    use crate::qualitative::{PARSE_ERROR_REASON, UNAVAILABLE_REASON};
    use crate::snapshot::fixtures::snapshot;
    use investor_llm::LLMError;

    fn scorer(mock: MockLlm, parallel: bool) -> QualitativeScorer {
        let config = AnalysisConfig {
            parallel_topics: parallel,
            ..AnalysisConfig::default()
        };
        QualitativeScorer::new(Arc::new(mock), &config).unwrap()
    }

    fn answer_for(prompt: &str) -> &'static str {
        if prompt.contains("Moat/Product") {
            "3.5|Dominant platform"
        } else if prompt.contains("Revenue Growth") {
            "bad"
        } else if prompt.contains("Competitive Advantage") {
            "2.0|Some rivals"
        } else if prompt.contains("Profitability") {
            "4.0|Best-in-class margins"
        } else {
            "1.5|Key-person risk"
        }
    }

    #[tokio::test]
    async fn test_sequential_scoring_isolates_parse_failure() {
        let mut mock = MockLlm::new();
        mock.expect_complete()
            .withf(|r| r.model == "llama-3.3-70b-versatile" && r.max_tokens == 100)
            .times(5)
            .returning(|r| Ok(reply(answer_for(prompt_of(&r)))));

        let summary = scorer(mock, false).score(&snapshot(100.0, Some(4.0), &[])).await;

        assert_eq!(summary.total, 11.0);
        let topics: Vec<Topic> = summary.topics.iter().map(|t| t.topic).collect();
        assert_eq!(topics, Topic::ALL.to_vec());
        assert_eq!(summary.topics[1].reason, PARSE_ERROR_REASON);
        assert_eq!(summary.topics[3].reason, "Best-in-class margins");
        assert!(!summary.used_fallback());
    }

    #[tokio::test]
    async fn test_parallel_scoring_keeps_topic_order() {
        let mut mock = MockLlm::new();
        mock.expect_complete()
            .times(5)
            .returning(|r| Ok(reply(answer_for(prompt_of(&r)))));

        let summary = scorer(mock, true).score(&snapshot(100.0, Some(4.0), &[])).await;

        assert_eq!(summary.total, 11.0);
        assert_eq!(summary.topics[0].topic, Topic::Moat);
        assert_eq!(summary.topics[4].topic, Topic::Management);
        assert_eq!(summary.topics[4].score, 1.5);
    }

    #[tokio::test]
    async fn test_backup_model_answers_are_flagged() {
        let mut mock = MockLlm::new();
        mock.expect_complete()
            .withf(|r| r.model == "llama-3.3-70b-versatile")
            .times(5)
            .returning(|_| Err(LLMError::RateLimitExceeded("429".to_string())));
        mock.expect_complete()
            .withf(|r| r.model == "llama-3.1-8b-instant")
            .times(5)
            .returning(|_| Ok(reply("2|fine")));

        let summary = scorer(mock, false).score(&snapshot(100.0, Some(4.0), &[])).await;

        assert_eq!(summary.total, 10.0);
        assert!(summary.topics.iter().all(|t| t.used_fallback));
    }

    #[tokio::test]
    async fn test_provider_failure_zeroes_only_that_topic() {
        let mut mock = MockLlm::new();
        mock.expect_complete()
            .withf(|r| prompt_of(r).contains("Management"))
            .returning(|_| Err(LLMError::RequestFailed("HTTP 503".to_string())));
        mock.expect_complete()
            .withf(|r| !prompt_of(r).contains("Management"))
            .returning(|_| Ok(reply("4|solid")));

        let summary = scorer(mock, false).score(&snapshot(100.0, Some(4.0), &[])).await;

        assert_eq!(summary.total, 16.0);
        assert_eq!(summary.topics[4].score, 0.0);
        assert_eq!(summary.topics[4].reason, UNAVAILABLE_REASON);
        assert_eq!(summary.failed_topics(), 1);
    }

    #[tokio::test]
    async fn test_failed_backup_still_counts_as_fallback() {
        let mut mock = MockLlm::new();
        mock.expect_complete()
            .withf(|r| r.model == "llama-3.3-70b-versatile")
            .times(5)
            .returning(|_| Err(LLMError::RateLimitExceeded("429".to_string())));
        mock.expect_complete()
            .withf(|r| r.model == "llama-3.1-8b-instant")
            .times(5)
            .returning(|_| Err(LLMError::RequestFailed("HTTP 503".to_string())));

        let summary = scorer(mock, false).score(&snapshot(100.0, Some(4.0), &[])).await;

        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.failed_topics(), 5);
        assert!(summary.topics.iter().all(|t| t.used_fallback));
        assert!(summary.used_fallback());
    }

    #[tokio::test]
    async fn test_render_failure_skips_provider() {
        let mut mock = MockLlm::new();
        mock.expect_complete().never();

        let scorer = scorer(mock, false).with_prompt(TopicPrompt::new("{{ missing }}").unwrap());
        let summary = scorer.score(&snapshot(100.0, Some(4.0), &[])).await;

        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.failed_topics(), 5);
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let config = AnalysisConfig {
            llm_requests_per_minute: 0,
            ..AnalysisConfig::default()
        };
        assert!(QualitativeScorer::new(Arc::new(MockLlm::new()), &config).is_err());
    }
}
