//! Shared utilities for value-investor
//!
//! This crate provides the ambient pieces used across the workspace:
//! tracing subscriber setup and small helpers for reading configuration
//! from the environment.

pub mod config;
pub mod logging;

pub use config::{LogConfig, env_flag, env_parse, env_var};
pub use logging::{init_tracing, init_tracing_with};
