//! LLM provider abstraction layer for value-investor
//!
//! This crate provides provider-agnostic types for sending a single-turn
//! chat completion to a Large Language Model, plus:
//!
//! - the [`LLMProvider`] trait implemented by concrete providers
//! - an OpenAI-compatible provider (works against Groq, OpenAI, local servers)
//! - [`complete_with_fallback`], the one-shot primary → backup model retry

pub mod completion;
pub mod error;
pub mod fallback;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use fallback::{FallbackError, FallbackResponse, complete_with_fallback};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

#[cfg(test)]
pub use provider::MockLLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;
