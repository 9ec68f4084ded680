//! Alpha Vantage API client
//!
//! Responses are decoded into the typed structs below and only then mapped
//! into [`PriceBar`] and [`StockSnapshot`].

use super::SeriesProvider;
use crate::error::{AdvisorError, Result};
use crate::models::{HistoryRange, PriceBar, StockSnapshot, sorted_by_date};
use crate::rate_limit::ApiRateLimiter;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_NAME: &str = "Alpha Vantage";
/// Trading days returned by `outputsize=compact`
const COMPACT_TRADING_DAYS: i64 = 100;

/// Status fields Alpha Vantage puts in place of data
#[derive(Debug, Default, Deserialize)]
pub struct ApiStatus {
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    /// Sent when the per-minute quota is exhausted
    #[serde(rename = "Note")]
    pub note: Option<String>,
    /// Sent when the daily quota is exhausted or for premium endpoints
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

impl ApiStatus {
    fn check(&self) -> Result<()> {
        if let Some(message) = &self.error_message {
            return Err(AdvisorError::AlphaVantageError(message.clone()));
        }
        if let Some(message) = self.note.as_ref().or(self.information.as_ref()) {
            debug!(detail = %message, "Alpha Vantage throttled the request");
            return Err(AdvisorError::RateLimitExceeded {
                provider: PROVIDER_NAME.to_string(),
            });
        }
        Ok(())
    }
}

/// `TIME_SERIES_DAILY` response
#[derive(Debug, Deserialize)]
pub struct DailySeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    pub time_series: Option<BTreeMap<String, DailyEntry>>,
    #[serde(flatten)]
    pub status: ApiStatus,
}

#[derive(Debug, Deserialize)]
pub struct DailyEntry {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

/// `GLOBAL_QUOTE` response
#[derive(Debug, Deserialize)]
pub struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    pub quote: Option<GlobalQuote>,
    #[serde(flatten)]
    pub status: ApiStatus,
}

/// Unknown symbols come back as an empty object, so every field is optional
#[derive(Debug, Default, Deserialize)]
pub struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "02. open")]
    pub open: Option<String>,
    #[serde(rename = "03. high")]
    pub high: Option<String>,
    #[serde(rename = "04. low")]
    pub low: Option<String>,
    #[serde(rename = "05. price")]
    pub price: Option<String>,
    #[serde(rename = "06. volume")]
    pub volume: Option<String>,
    #[serde(rename = "07. latest trading day")]
    pub latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close")]
    pub previous_close: Option<String>,
    #[serde(rename = "09. change")]
    pub change: Option<String>,
    /// Percent with a trailing `%`, e.g. "1.2345%"
    #[serde(rename = "10. change percent")]
    pub change_percent: Option<String>,
}

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: ApiRateLimiter,
}

impl AlphaVantageClient {
    /// Create a new client drawing from the shared request quota
    pub fn new(
        api_key: impl Into<String>,
        rate_limiter: ApiRateLimiter,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter,
        })
    }

    async fn query<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(BASE_URL)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdvisorError::AlphaVantageError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    /// Daily bars, oldest first
    #[instrument(skip(self))]
    pub async fn get_daily(&self, symbol: &str, range: HistoryRange) -> Result<Vec<PriceBar>> {
        let output_size = if range.duration().num_days() > COMPACT_TRADING_DAYS {
            "full"
        } else {
            "compact"
        };

        let response: DailySeriesResponse = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", output_size),
            ])
            .await?;

        let bars = daily_bars(symbol, response)?;
        let start = range.start_from(Utc::now().date_naive());
        Ok(bars.into_iter().filter(|bar| bar.date >= start).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_quote(&self, symbol: &str) -> Result<StockSnapshot> {
        let response: GlobalQuoteResponse = self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;
        quote_snapshot(symbol, response)
    }
}

#[async_trait]
impl SeriesProvider for AlphaVantageClient {
    async fn get_bars(&self, symbol: &str, range: HistoryRange) -> Result<Vec<PriceBar>> {
        self.get_daily(symbol, range).await
    }

    async fn get_snapshot(&self, symbol: &str) -> Result<StockSnapshot> {
        self.get_quote(symbol).await
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn parse_field<T>(field: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        AdvisorError::AlphaVantageError(format!("Invalid {field} value {raw:?}: {e}"))
    })
}

fn required<'a>(field: &str, value: Option<&'a String>) -> Result<&'a str> {
    value
        .map(String::as_str)
        .ok_or_else(|| AdvisorError::AlphaVantageError(format!("Missing {field} in quote")))
}

/// Map a decoded daily series into bars sorted by date
pub fn daily_bars(symbol: &str, response: DailySeriesResponse) -> Result<Vec<PriceBar>> {
    response.status.check()?;

    let series = response.time_series.ok_or_else(|| AdvisorError::DataUnavailable {
        symbol: symbol.to_string(),
        reason: "No daily time series in response".to_string(),
    })?;

    let bars = series
        .iter()
        .map(|(date, entry)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                AdvisorError::AlphaVantageError(format!("Invalid date {date:?}: {e}"))
            })?;
            Ok(PriceBar::new(
                date,
                parse_field("open", &entry.open)?,
                parse_field("high", &entry.high)?,
                parse_field("low", &entry.low)?,
                parse_field("close", &entry.close)?,
                parse_field("volume", &entry.volume)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(sorted_by_date(&bars))
}

/// Map a decoded global quote into a snapshot
pub fn quote_snapshot(symbol: &str, response: GlobalQuoteResponse) -> Result<StockSnapshot> {
    response.status.check()?;

    let quote = response
        .quote
        .filter(|quote| quote.symbol.is_some())
        .ok_or_else(|| AdvisorError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "Empty global quote".to_string(),
        })?;

    let change_percent = required("change percent", quote.change_percent.as_ref())?;

    Ok(StockSnapshot {
        symbol: quote.symbol.clone().unwrap_or_else(|| symbol.to_string()),
        company_name: None,
        current_price: parse_field("price", required("price", quote.price.as_ref())?)?,
        previous_close: parse_field(
            "previous close",
            required("previous close", quote.previous_close.as_ref())?,
        )?,
        day_change_percent: parse_field("change percent", change_percent.trim_end_matches('%'))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY: &str = r#"{
        "Meta Data": {
            "1. Information": "Daily Prices (open, high, low, close) and Volumes",
            "2. Symbol": "IBM"
        },
        "Time Series (Daily)": {
            "2024-03-05": {
                "1. open": "191.0000",
                "2. high": "193.5000",
                "3. low": "190.2500",
                "4. close": "192.7500",
                "5. volume": "4587000"
            },
            "2024-03-04": {
                "1. open": "189.5000",
                "2. high": "191.8000",
                "3. low": "188.9000",
                "4. close": "190.9500",
                "5. volume": "3920000"
            }
        }
    }"#;

    const QUOTE: &str = r#"{
        "Global Quote": {
            "01. symbol": "IBM",
            "02. open": "191.0000",
            "03. high": "193.5000",
            "04. low": "190.2500",
            "05. price": "192.7500",
            "06. volume": "4587000",
            "07. latest trading day": "2024-03-05",
            "08. previous close": "190.9500",
            "09. change": "1.8000",
            "10. change percent": "0.9427%"
        }
    }"#;

    #[test]
    fn test_decode_daily_series() {
        let response: DailySeriesResponse = serde_json::from_str(DAILY).unwrap();
        let bars = daily_bars("IBM", response).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert!((bars[1].close - 192.75).abs() < 1e-9);
        assert_eq!(bars[1].volume, 4_587_000);
    }

    #[test]
    fn test_decode_global_quote() {
        let response: GlobalQuoteResponse = serde_json::from_str(QUOTE).unwrap();
        let snapshot = quote_snapshot("IBM", response).unwrap();

        assert_eq!(snapshot.symbol, "IBM");
        assert!(snapshot.company_name.is_none());
        assert!((snapshot.current_price - 192.75).abs() < 1e-9);
        assert!((snapshot.previous_close - 190.95).abs() < 1e-9);
        assert!((snapshot.day_change_percent - 0.9427).abs() < 1e-9);
    }

    #[test]
    fn test_error_message_payload() {
        let json = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        let response: DailySeriesResponse = serde_json::from_str(json).unwrap();
        match daily_bars("NOPE", response) {
            Err(AdvisorError::AlphaVantageError(msg)) => assert!(msg.contains("Invalid API call")),
            other => panic!("Expected AlphaVantageError, got {other:?}"),
        }
    }

    #[test]
    fn test_throttling_payloads() {
        let note = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        let response: GlobalQuoteResponse = serde_json::from_str(note).unwrap();
        assert!(matches!(
            quote_snapshot("IBM", response),
            Err(AdvisorError::RateLimitExceeded { .. })
        ));

        let info = r#"{"Information": "You have reached the daily rate limit."}"#;
        let response: DailySeriesResponse = serde_json::from_str(info).unwrap();
        assert!(matches!(
            daily_bars("IBM", response),
            Err(AdvisorError::RateLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_empty_quote_is_unavailable() {
        let response: GlobalQuoteResponse = serde_json::from_str(r#"{"Global Quote": {}}"#).unwrap();
        assert!(matches!(
            quote_snapshot("NOPE", response),
            Err(AdvisorError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_malformed_number() {
        let json = r#"{"Time Series (Daily)": {"2024-03-05": {
            "1. open": "abc", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"
        }}}"#;
        let response: DailySeriesResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            daily_bars("IBM", response),
            Err(AdvisorError::AlphaVantageError(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Requires network access and ALPHA_VANTAGE_API_KEY
    async fn test_get_daily_live() {
        let key = std::env::var("ALPHA_VANTAGE_API_KEY").unwrap();
        let client =
            AlphaVantageClient::new(key, ApiRateLimiter::new(5).unwrap(), Duration::from_secs(30))
                .unwrap();
        let bars = client.get_daily("IBM", HistoryRange::OneMonth).await.unwrap();
        assert!(!bars.is_empty());
    }
}
