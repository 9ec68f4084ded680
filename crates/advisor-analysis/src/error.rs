//! Error types for stock analysis operations
//!
//! Indicator and trend math never fail; insufficient or malformed input yields
//! empty series or a SIDEWAYS default. Only calls that cross into a
//! collaborator (price data, text generation, persistence) produce these errors.

use thiserror::Error;

/// Stock analysis specific errors
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantageError(String),

    /// The text generator failed or returned nothing usable
    #[error("Text generation failed: {0}")]
    TextGenerationFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The persistence sink rejected a record
    #[error("Sink error: {0}")]
    SinkError(String),

    /// A collaborator failed while generating an analysis
    #[error("Failed to generate analysis for {symbol}: {source}")]
    AnalysisGenerationFailed {
        symbol: String,
        #[source]
        source: Box<AdvisorError>,
    },
}

impl AdvisorError {
    /// Wrap a collaborator failure for `symbol`
    pub fn generation_failed(symbol: impl Into<String>, source: AdvisorError) -> Self {
        AdvisorError::AnalysisGenerationFailed {
            symbol: symbol.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

impl From<advisor_llm::LLMError> for AdvisorError {
    fn from(err: advisor_llm::LLMError) -> Self {
        AdvisorError::TextGenerationFailed(err.to_string())
    }
}

impl From<advisor_utils::EnvError> for AdvisorError {
    fn from(err: advisor_utils::EnvError) -> Self {
        AdvisorError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = AdvisorError::InvalidSymbol("INVALID".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: INVALID");

        let err = AdvisorError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "No data found".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");
    }

    #[test]
    fn test_generation_failed_keeps_cause() {
        let err = AdvisorError::generation_failed(
            "MSFT",
            AdvisorError::RateLimitExceeded {
                provider: "Alpha Vantage".to_string(),
            },
        );

        assert_eq!(
            err.to_string(),
            "Failed to generate analysis for MSFT: Rate limit exceeded for Alpha Vantage"
        );
        let source = err.source().map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("Rate limit exceeded for Alpha Vantage")
        );
    }

    #[test]
    fn test_llm_error_conversion() {
        let err: AdvisorError = advisor_llm::LLMError::AuthenticationFailed.into();
        match err {
            AdvisorError::TextGenerationFailed(msg) => {
                assert!(msg.contains("authentication"));
            }
            other => panic!("Expected TextGenerationFailed, got {other:?}"),
        }
    }
}
