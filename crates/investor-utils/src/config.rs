//! Environment-driven configuration helpers

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default filter when neither `INVESTOR_LOG` nor `RUST_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "warn,investor_engine=info,investor_llm=info";

/// Read an environment variable, treating empty values as unset
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, ignoring values that fail to parse
pub fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| v.parse().ok())
}

/// Read a boolean flag (`1`, `true`, `yes`, `on`)
pub fn env_flag(key: &str) -> Option<bool> {
    env_var(key).map(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive string
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Build from `INVESTOR_LOG` (falling back to `RUST_LOG`) and `INVESTOR_LOG_JSON`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            filter: env_var("INVESTOR_LOG")
                .or_else(|| env_var("RUST_LOG"))
                .unwrap_or(defaults.filter),
            json: env_flag("INVESTOR_LOG_JSON").unwrap_or(defaults.json),
        }
    }

    /// Override the filter directive
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Toggle JSON output
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}
