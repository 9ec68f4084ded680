//! Market data types shared by the indicator engine, the trend detector and
//! the data providers

use crate::error::{AdvisorError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One daily OHLCV observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// High minus low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Copy of `bars` in ascending date order
///
/// Every calculation goes through this so callers never have to guarantee
/// ordering. The sort is stable, so bars sharing a date keep their input order.
pub fn sorted_by_date(bars: &[PriceBar]) -> Vec<PriceBar> {
    let mut sorted = bars.to_vec();
    sorted.sort_by_key(|bar| bar.date);
    sorted
}

/// Current quote for a symbol, as shown to the text generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub company_name: Option<String>,
    pub current_price: f64,
    pub previous_close: f64,
    /// Day change in percent (1.5 means +1.5%)
    pub day_change_percent: f64,
}

impl StockSnapshot {
    /// Derive a snapshot from the last two bars of a series
    ///
    /// Returns `None` for an empty series. With a single bar the previous
    /// close is the bar's open.
    pub fn from_bars(symbol: impl Into<String>, bars: &[PriceBar]) -> Option<Self> {
        let sorted = sorted_by_date(bars);
        let last = sorted.last()?;
        let previous_close = match sorted.len() {
            1 => last.open,
            n => sorted[n - 2].close,
        };

        Some(Self {
            symbol: symbol.into(),
            company_name: None,
            current_price: last.close,
            previous_close,
            day_change_percent: change_percent(previous_close, last.close),
        })
    }

    /// Company name, falling back to the ticker
    pub fn display_name(&self) -> &str {
        self.company_name.as_deref().unwrap_or(&self.symbol)
    }
}

pub(crate) fn change_percent(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        0.0
    } else {
        (to - from) / from * 100.0
    }
}

/// How much daily history to request from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    /// Enough daily bars for SMA200
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl HistoryRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryRange::OneMonth => "1mo",
            HistoryRange::ThreeMonths => "3mo",
            HistoryRange::SixMonths => "6mo",
            HistoryRange::OneYear => "1y",
            HistoryRange::TwoYears => "2y",
        }
    }

    /// Calendar length of the range
    pub fn duration(&self) -> Duration {
        match self {
            HistoryRange::OneMonth => Duration::days(30),
            HistoryRange::ThreeMonths => Duration::days(90),
            HistoryRange::SixMonths => Duration::days(180),
            HistoryRange::OneYear => Duration::days(365),
            HistoryRange::TwoYears => Duration::days(730),
        }
    }

    /// First calendar date covered when the range ends on `end`
    pub fn start_from(&self, end: NaiveDate) -> NaiveDate {
        end - self.duration()
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1mo" => Ok(HistoryRange::OneMonth),
            "3mo" => Ok(HistoryRange::ThreeMonths),
            "6mo" => Ok(HistoryRange::SixMonths),
            "1y" => Ok(HistoryRange::OneYear),
            "2y" => Ok(HistoryRange::TwoYears),
            other => Err(AdvisorError::ConfigError(format!(
                "Invalid range: {other}. Supported: 1mo, 3mo, 6mo, 1y, 2y"
            ))),
        }
    }
}
