//! Configuration for stock analysis operations

use crate::error::{AdvisorError, Result};
use crate::models::HistoryRange;
use advisor_utils::{env_parse, env_var};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Data provider for price history and quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataProvider {
    /// Yahoo Finance (default, no API key required)
    #[default]
    Yahoo,
    /// Alpha Vantage (requires API key)
    AlphaVantage,
}

impl fmt::Display for DataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataProvider::Yahoo => f.write_str("yahoo"),
            DataProvider::AlphaVantage => f.write_str("alpha-vantage"),
        }
    }
}

impl FromStr for DataProvider {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(DataProvider::Yahoo),
            "alpha-vantage" | "alpha_vantage" | "alphavantage" => Ok(DataProvider::AlphaVantage),
            other => Err(AdvisorError::ConfigError(format!(
                "Unknown provider: {other}. Supported: yahoo, alpha-vantage"
            ))),
        }
    }
}

/// Configuration for the analysis pipeline and its collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Source of price bars and quotes
    pub provider: DataProvider,

    /// History requested per symbol
    pub history_range: HistoryRange,

    /// Lifetime of cached price bars, in seconds
    pub bar_cache_ttl_secs: u64,

    /// HTTP timeout for data and text-generation calls, in seconds
    pub request_timeout_secs: u64,

    /// Shared quota across all outbound data requests
    pub requests_per_minute: u32,

    /// Text generation model
    pub model: String,

    /// Token budget for a single piece of advice
    pub max_tokens: usize,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,

    /// Maximum analyses in flight during a scheduled batch
    pub concurrency: usize,

    /// Pause after each job before a worker takes the next one, in milliseconds
    pub inter_job_delay_ms: u64,

    /// When false, scheduled batches are skipped entirely
    pub scheduled_updates_enabled: bool,

    /// Alpha Vantage API key (optional)
    pub alpha_vantage_api_key: Option<String>,

    /// OpenAI-compatible API key (optional)
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible API base URL (optional)
    pub openai_api_base: Option<String>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            provider: DataProvider::Yahoo,
            history_range: HistoryRange::OneYear,
            bar_cache_ttl_secs: 300, // 5 minutes
            request_timeout_secs: 30,
            // Alpha Vantage free tier
            requests_per_minute: 5,
            model: "gpt-4".to_string(),
            max_tokens: 1000,
            temperature: 0.5,
            concurrency: 2,
            inter_job_delay_ms: 500,
            scheduled_updates_enabled: true,
            alpha_vantage_api_key: None,
            openai_api_key: None,
            openai_api_base: None,
        }
    }
}

impl AdvisorConfig {
    /// Create a new configuration builder
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::default()
    }

    /// Overlay settings from the environment
    ///
    /// Reads `ALPHA_VANTAGE_API_KEY`, `OPENAI_API_KEY`, `OPENAI_API_BASE`,
    /// `OPENAI_MODEL` and the `ADVISOR_*` overrides. Unset variables keep the
    /// current value; unparsable ones are an error.
    pub fn with_env(mut self) -> Result<Self> {
        if let Some(key) = env_var("ALPHA_VANTAGE_API_KEY") {
            self.alpha_vantage_api_key = Some(key);
        }
        if let Some(key) = env_var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(base) = env_var("OPENAI_API_BASE") {
            self.openai_api_base = Some(base);
        }
        if let Some(model) = env_var("OPENAI_MODEL") {
            self.model = model;
        }

        if let Some(provider) = env_parse("ADVISOR_PROVIDER")? {
            self.provider = provider;
        }
        if let Some(range) = env_parse("ADVISOR_RANGE")? {
            self.history_range = range;
        }
        if let Some(ttl) = env_parse("ADVISOR_CACHE_TTL_SECS")? {
            self.bar_cache_ttl_secs = ttl;
        }
        if let Some(timeout) = env_parse("ADVISOR_REQUEST_TIMEOUT_SECS")? {
            self.request_timeout_secs = timeout;
        }
        if let Some(rpm) = env_parse("ADVISOR_REQUESTS_PER_MINUTE")? {
            self.requests_per_minute = rpm;
        }
        if let Some(max_tokens) = env_parse("ADVISOR_MAX_TOKENS")? {
            self.max_tokens = max_tokens;
        }
        if let Some(temperature) = env_parse("ADVISOR_TEMPERATURE")? {
            self.temperature = temperature;
        }
        if let Some(concurrency) = env_parse("ADVISOR_CONCURRENCY")? {
            self.concurrency = concurrency;
        }
        if let Some(delay) = env_parse("ADVISOR_INTER_JOB_DELAY_MS")? {
            self.inter_job_delay_ms = delay;
        }
        if let Some(enabled) = env_parse("ADVISOR_SCHEDULED_UPDATES")? {
            self.scheduled_updates_enabled = enabled;
        }

        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.provider == DataProvider::AlphaVantage && self.alpha_vantage_api_key.is_none() {
            return Err(AdvisorError::ConfigError(
                "Alpha Vantage API key required when using AlphaVantage provider".to_string(),
            ));
        }

        if self.requests_per_minute == 0 {
            return Err(AdvisorError::ConfigError(
                "requests_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(AdvisorError::ConfigError(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(AdvisorError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AdvisorError::ConfigError(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.bar_cache_ttl_secs == 0 {
            return Err(AdvisorError::ConfigError(
                "bar_cache_ttl_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bar_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.bar_cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn inter_job_delay(&self) -> Duration {
        Duration::from_millis(self.inter_job_delay_ms)
    }
}

/// Builder for AdvisorConfig
#[derive(Debug, Default)]
pub struct AdvisorConfigBuilder {
    provider: Option<DataProvider>,
    history_range: Option<HistoryRange>,
    bar_cache_ttl: Option<Duration>,
    request_timeout: Option<Duration>,
    requests_per_minute: Option<u32>,
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    concurrency: Option<usize>,
    inter_job_delay: Option<Duration>,
    scheduled_updates_enabled: Option<bool>,
    alpha_vantage_api_key: Option<String>,
    openai_api_key: Option<String>,
    openai_api_base: Option<String>,
}

impl AdvisorConfigBuilder {
    /// Set the data provider
    pub fn provider(mut self, provider: DataProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set how much history to fetch
    pub fn history_range(mut self, range: HistoryRange) -> Self {
        self.history_range = Some(range);
        self
    }

    /// Set the cached bar lifetime
    pub fn bar_cache_ttl(mut self, ttl: Duration) -> Self {
        self.bar_cache_ttl = Some(ttl);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    pub fn requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = Some(rpm);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the scheduler's worker count
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn inter_job_delay(mut self, delay: Duration) -> Self {
        self.inter_job_delay = Some(delay);
        self
    }

    pub fn scheduled_updates_enabled(mut self, enabled: bool) -> Self {
        self.scheduled_updates_enabled = Some(enabled);
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    pub fn openai_api_base(mut self, base: impl Into<String>) -> Self {
        self.openai_api_base = Some(base.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AdvisorConfig> {
        let defaults = AdvisorConfig::default();

        let config = AdvisorConfig {
            provider: self.provider.unwrap_or(defaults.provider),
            history_range: self.history_range.unwrap_or(defaults.history_range),
            bar_cache_ttl_secs: self
                .bar_cache_ttl
                .map_or(defaults.bar_cache_ttl_secs, |d| d.as_secs()),
            request_timeout_secs: self
                .request_timeout
                .map_or(defaults.request_timeout_secs, |d| d.as_secs()),
            requests_per_minute: self.requests_per_minute.unwrap_or(defaults.requests_per_minute),
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            inter_job_delay_ms: self
                .inter_job_delay
                .map_or(defaults.inter_job_delay_ms, |d| d.as_millis() as u64),
            scheduled_updates_enabled: self
                .scheduled_updates_enabled
                .unwrap_or(defaults.scheduled_updates_enabled),
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            openai_api_key: self.openai_api_key,
            openai_api_base: self.openai_api_base,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdvisorConfig::default();
        assert_eq!(config.provider, DataProvider::Yahoo);
        assert_eq!(config.requests_per_minute, 5);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.inter_job_delay(), Duration::from_millis(500));
        assert!(config.scheduled_updates_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AdvisorConfig::builder()
            .history_range(HistoryRange::SixMonths)
            .concurrency(4)
            .request_timeout(Duration::from_secs(60))
            .inter_job_delay(Duration::from_millis(50))
            .build()
            .unwrap();

        assert_eq!(config.history_range, HistoryRange::SixMonths);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.inter_job_delay_ms, 50);
    }

    #[test]
    fn test_validation_alpha_vantage_no_key() {
        let config = AdvisorConfig {
            provider: DataProvider::AlphaVantage,
            alpha_vantage_api_key: None,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_alpha_vantage_with_key() {
        let config = AdvisorConfig {
            provider: DataProvider::AlphaVantage,
            alpha_vantage_api_key: Some("test_key".to_string()),
            ..Default::default()
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        assert!(AdvisorConfig::builder().concurrency(0).build().is_err());
        assert!(AdvisorConfig::builder().requests_per_minute(0).build().is_err());
        assert!(AdvisorConfig::builder().temperature(3.0).build().is_err());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("Yahoo".parse::<DataProvider>().unwrap(), DataProvider::Yahoo);
        assert_eq!(
            "alpha-vantage".parse::<DataProvider>().unwrap(),
            DataProvider::AlphaVantage
        );
        assert!("bloomberg".parse::<DataProvider>().is_err());
        assert_eq!(DataProvider::AlphaVantage.to_string(), "alpha-vantage");
    }

    #[test]
    fn test_with_env_overrides() {
        // SAFETY: only this test touches these ADVISOR_* variables
        unsafe {
            std::env::set_var("ADVISOR_CONCURRENCY", "not-a-number");
        }
        assert!(matches!(
            AdvisorConfig::default().with_env(),
            Err(AdvisorError::ConfigError(_))
        ));

        unsafe {
            std::env::set_var("ADVISOR_CONCURRENCY", "8");
            std::env::set_var("ADVISOR_RANGE", "3mo");
            std::env::set_var("ADVISOR_SCHEDULED_UPDATES", "false");
        }
        let config = AdvisorConfig::default().with_env().unwrap();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.history_range, HistoryRange::ThreeMonths);
        assert!(!config.scheduled_updates_enabled);

        unsafe {
            std::env::remove_var("ADVISOR_CONCURRENCY");
            std::env::remove_var("ADVISOR_RANGE");
            std::env::remove_var("ADVISOR_SCHEDULED_UPDATES");
        }
    }
}
