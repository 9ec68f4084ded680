//! Stock analytics pipeline
//!
//! This crate turns daily price history into a trading recommendation. It
//! includes:
//!
//! - Technical indicators (SMA, EMA, RSI, MACD, Bollinger Bands, VWAP, ATR)
//! - Trend, market regime and breakout detection
//! - Advisory prompt construction and recommendation extraction
//! - Price data from Yahoo Finance or Alpha Vantage behind a shared rate limiter
//! - A per-symbol orchestrator and a bounded batch scheduler
//!
//! # Architecture
//!
//! `AnalysisOrchestrator` fetches bars (through a TTL cache) and a snapshot from
//! a `SeriesProvider`, computes indicators and the trend, asks a
//! `TextGenerator` for advice and returns an `AnalysisRecord`.
//! `AnalysisScheduler` runs the orchestrator over many symbols and hands each
//! record to an `AnalysisSink`.
//!
//! # Example
//!
//! ```rust,ignore
//! use advisor_analysis::{
//!     AdvisorConfig, AnalysisOrchestrator, AnalysisScheduler, ApiRateLimiter,
//!     LlmTextGenerator, MemoryAnalysisSink, YahooFinanceClient,
//! };
//! use advisor_llm::providers::OpenAIProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AdvisorConfig::default().with_env()?;
//!     let limiter = ApiRateLimiter::new(config.requests_per_minute)?;
//!
//!     let provider = Arc::new(YahooFinanceClient::new(limiter));
//!     let llm = Arc::new(OpenAIProvider::from_env()?);
//!     let generator = Arc::new(LlmTextGenerator::from_config(llm, &config));
//!
//!     let orchestrator = AnalysisOrchestrator::new(provider, generator, config.bar_cache_ttl());
//!     let sink = Arc::new(MemoryAnalysisSink::new());
//!     let scheduler = AnalysisScheduler::from_config(Arc::new(orchestrator), sink, &config);
//!
//!     let report = scheduler.run_batch(&["AAPL".to_string()]).await;
//!     println!("{} completed", report.completed.len());
//!     Ok(())
//! }
//! ```

pub mod advisory;
pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod indicators;
pub mod models;
pub mod rate_limit;
pub mod scheduler;
pub mod sink;
pub mod trend;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use advisory::{AdvisorySynthesizer, IndicatorReading, Recommendation, RecommendationResult};
pub use api::{AlphaVantageClient, SeriesProvider, YahooFinanceClient};
pub use cache::{BarCache, BarKey};
pub use config::{AdvisorConfig, DataProvider};
pub use engine::{AnalysisOrchestrator, AnalysisRecord};
pub use error::{AdvisorError, Result};
pub use generator::{LlmTextGenerator, TextGenerator};
pub use indicators::{IndicatorEngine, IndicatorSeries, IndicatorSet};
pub use models::{HistoryRange, PriceBar, StockSnapshot};
pub use rate_limit::ApiRateLimiter;
pub use scheduler::{AnalysisScheduler, BatchReport, FailedSymbol};
pub use sink::{AnalysisSink, MemoryAnalysisSink};
pub use trend::{TrendDetector, TrendType};
