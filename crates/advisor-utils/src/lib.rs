//! Shared utilities for stock-advisor
//!
//! This crate provides common functionality used across the stock-advisor workspace:
//! tracing setup and helpers for reading typed settings from the environment.

pub mod config;
pub mod logging;

pub use config::{EnvError, env_parse, env_var};
pub use logging::{LogFormat, init_tracing};
