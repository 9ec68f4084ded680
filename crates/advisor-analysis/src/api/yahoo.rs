//! Yahoo Finance API client

use super::SeriesProvider;
use crate::error::{AdvisorError, Result};
use crate::models::{HistoryRange, PriceBar, StockSnapshot, sorted_by_date};
use crate::rate_limit::ApiRateLimiter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use tracing::{instrument, warn};
use yahoo_finance_api as yahoo;

const PROVIDER_NAME: &str = "Yahoo Finance";

/// Yahoo Finance API client
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    rate_limiter: ApiRateLimiter,
}

impl YahooFinanceClient {
    /// Create a new client drawing from the shared request quota
    pub fn new(rate_limiter: ApiRateLimiter) -> Self {
        Self { rate_limiter }
    }

    async fn connector(&self) -> Result<yahoo::YahooConnector> {
        self.rate_limiter.until_ready().await;
        yahoo::YahooConnector::new().map_err(|e| AdvisorError::YahooFinanceError(e.to_string()))
    }

    /// Daily bars between `start` and `end`, oldest first
    #[instrument(skip(self))]
    pub async fn get_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>> {
        let provider = self.connector().await?;

        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp()).map_err(|e| {
            AdvisorError::YahooFinanceError(format!("Invalid start timestamp: {e}"))
        })?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| AdvisorError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| AdvisorError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| AdvisorError::YahooFinanceError(e.to_string()))?;

        Ok(to_bars(symbol, &quotes))
    }

    /// Daily bars covering `range` up to now
    pub async fn get_history_range(&self, symbol: &str, range: HistoryRange) -> Result<Vec<PriceBar>> {
        let end = Utc::now();
        self.get_history(symbol, end - range.duration(), end).await
    }

    /// Snapshot from the latest daily quotes
    ///
    /// The connector exposes no company name, so it stays empty.
    #[instrument(skip(self))]
    pub async fn get_quote(&self, symbol: &str) -> Result<StockSnapshot> {
        let provider = self.connector().await?;

        let response = provider
            .get_latest_quotes(symbol, "1d")
            .await
            .map_err(|e| AdvisorError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| AdvisorError::YahooFinanceError(e.to_string()))?;

        StockSnapshot::from_bars(symbol, &to_bars(symbol, &quotes)).ok_or_else(|| {
            AdvisorError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "No quotes returned".to_string(),
            }
        })
    }
}

#[async_trait]
impl SeriesProvider for YahooFinanceClient {
    async fn get_bars(&self, symbol: &str, range: HistoryRange) -> Result<Vec<PriceBar>> {
        self.get_history_range(symbol, range).await
    }

    async fn get_snapshot(&self, symbol: &str) -> Result<StockSnapshot> {
        self.get_quote(symbol).await
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn to_bars(symbol: &str, quotes: &[yahoo::Quote]) -> Vec<PriceBar> {
    let bars: Vec<PriceBar> = quotes
        .iter()
        .filter_map(|q| {
            let Some(timestamp) = DateTime::from_timestamp(q.timestamp as i64, 0) else {
                warn!(symbol, timestamp = q.timestamp, "Skipping quote with invalid timestamp");
                return None;
            };
            Some(PriceBar::new(
                timestamp.date_naive(),
                q.open,
                q.high,
                q.low,
                q.close,
                q.volume,
            ))
        })
        .collect();
    sorted_by_date(&bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> YahooFinanceClient {
        YahooFinanceClient::new(ApiRateLimiter::new(60).unwrap())
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_quote() {
        let snapshot = client().get_quote("AAPL").await.unwrap();
        assert_eq!(snapshot.symbol, "AAPL");
        assert!(snapshot.current_price > 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_history_range() {
        let bars = client()
            .get_history_range("AAPL", HistoryRange::OneMonth)
            .await
            .unwrap();
        assert!(!bars.is_empty());
        assert!(bars.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_unknown_symbol() {
        assert!(client().get_quote("INVALID_SYMBOL_12345").await.is_err());
    }
}
