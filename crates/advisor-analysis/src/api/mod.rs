//! Market data clients

pub mod alpha_vantage;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::models::{HistoryRange, PriceBar, StockSnapshot};
use async_trait::async_trait;

/// Source of daily bars and current quotes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Daily bars for `symbol` over `range`, oldest first
    async fn get_bars(&self, symbol: &str, range: HistoryRange) -> Result<Vec<PriceBar>>;

    async fn get_snapshot(&self, symbol: &str) -> Result<StockSnapshot>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}
