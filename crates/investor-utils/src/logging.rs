//! Logging and tracing utilities

use crate::config::LogConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber from the environment
pub fn init_tracing() {
    init_tracing_with(&LogConfig::from_env());
}

/// Initialize tracing subscriber with an explicit configuration
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing_with(config: &LogConfig) {
    let filter = EnvFilter::try_new(&config.filter)
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    let _ = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}
