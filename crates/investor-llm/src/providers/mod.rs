//! Concrete LLM provider implementations

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{GROQ_API_BASE, OpenAIConfig, OpenAIProvider};
