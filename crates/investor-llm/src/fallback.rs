//! Primary → backup model fallback
//!
//! A completion is attempted once against the request's model. If that
//! fails for any reason it is attempted exactly once more against the
//! backup model. There is no sleep and no loop.

use crate::{CompletionRequest, CompletionResponse, LLMError, LLMProvider};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Completion together with which model produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackResponse {
    /// The successful completion
    pub response: CompletionResponse,

    /// Model that produced `response`
    pub model: String,

    /// True when the primary attempt failed and the backup answered
    pub used_fallback: bool,
}

impl FallbackResponse {
    /// Assistant text
    pub fn text(&self) -> &str {
        self.response.text()
    }
}

/// Both attempts failed
#[derive(Debug, Error)]
#[error("{source}")]
pub struct FallbackError {
    /// Error of the last attempt made
    pub source: LLMError,

    /// True when the backup model was tried
    pub used_fallback: bool,
}

/// Complete `request`, retrying once against `backup_model` on failure
///
/// When both attempts fail the backup's error is returned.
#[instrument(skip(provider, request), fields(primary = %request.model, backup = %backup_model))]
pub async fn complete_with_fallback(
    provider: &dyn LLMProvider,
    request: CompletionRequest,
    backup_model: &str,
) -> Result<FallbackResponse, FallbackError> {
    let primary_model = request.model.clone();
    let backup_request = request.with_model(backup_model);

    match provider.complete(request).await {
        Ok(response) => {
            debug!(tokens = response.usage.total(), "primary model answered");
            return Ok(FallbackResponse {
                response,
                model: primary_model,
                used_fallback: false,
            });
        }
        Err(err) => warn!(error = %err, "primary model failed, retrying with backup"),
    }

    match provider.complete(backup_request).await {
        Ok(response) => Ok(FallbackResponse {
            response,
            model: backup_model.to_string(),
            used_fallback: true,
        }),
        Err(err) => {
            warn!(error = %err, "backup model failed");
            Err(FallbackError {
                source: err,
                used_fallback: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LLMError, Message, MockLLMProvider, StopReason, TokenUsage};

    fn reply(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage {
                input_tokens: 40,
                output_tokens: 12,
            },
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest::builder("primary")
            .add_message(Message::user("Analyze NVDA regarding 'Management'"))
            .max_tokens(100)
            .build()
    }

    #[tokio::test]
    async fn test_primary_success_skips_backup() {
        let mut mock = MockLLMProvider::new();
        mock.expect_complete()
            .withf(|r| r.model == "primary")
            .times(1)
            .returning(|_| Ok(reply("3.5|Visionary founder")));

        let out = complete_with_fallback(&mock, request(), "backup")
            .await
            .unwrap();
        assert!(!out.used_fallback);
        assert_eq!(out.model, "primary");
        assert_eq!(out.text(), "3.5|Visionary founder");
    }

    #[tokio::test]
    async fn test_rate_limited_primary_uses_backup_once() {
        let mut mock = MockLLMProvider::new();
        mock.expect_complete()
            .withf(|r| r.model == "primary")
            .times(1)
            .returning(|_| Err(LLMError::RateLimitExceeded("429".to_string())));
        mock.expect_complete()
            .withf(|r| r.model == "backup")
            .times(1)
            .returning(|_| Ok(reply("2.0|Adequate")));

        let out = complete_with_fallback(&mock, request(), "backup")
            .await
            .unwrap();
        assert!(out.used_fallback);
        assert_eq!(out.model, "backup");
        assert_eq!(out.text(), "2.0|Adequate");
    }

    #[tokio::test]
    async fn test_both_fail_returns_backup_error() {
        let mut mock = MockLLMProvider::new();
        mock.expect_complete()
            .withf(|r| r.model == "primary")
            .times(1)
            .returning(|_| Err(LLMError::RateLimitExceeded("429".to_string())));
        mock.expect_complete()
            .withf(|r| r.model == "backup")
            .times(1)
            .returning(|_| Err(LLMError::RequestFailed("HTTP 503".to_string())));

        let err = complete_with_fallback(&mock, request(), "backup")
            .await
            .unwrap_err();
        assert!(matches!(err.source, LLMError::RequestFailed(_)));
        assert!(err.used_fallback);
        assert_eq!(err.to_string(), "API request failed: HTTP 503");
    }

    #[tokio::test]
    async fn test_auth_failure_still_tries_backup() {
        let mut mock = MockLLMProvider::new();
        mock.expect_complete()
            .withf(|r| r.model == "primary")
            .times(1)
            .returning(|_| Err(LLMError::AuthenticationFailed));
        mock.expect_complete()
            .withf(|r| r.model == "backup")
            .times(1)
            .returning(|_| Ok(reply("1.0|Weak moat")));

        let out = complete_with_fallback(&mock, request(), "backup")
            .await
            .unwrap();
        assert!(out.used_fallback);
        assert_eq!(out.text(), "1.0|Weak moat");
    }
}
