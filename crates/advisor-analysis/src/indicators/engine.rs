//! Indicator engine and the standard indicator bundle

use super::{
    BollingerPoint, IndicatorSeries, MacdPoint, atr, bollinger_bands, ema, macd, rsi, sma, vwap,
};
use crate::models::PriceBar;
use crate::trend::{MIN_TREND_BARS, TrendDetector, TrendType};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stateless facade over the indicator functions
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine;

/// Standard indicators for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub sma20: IndicatorSeries<f64>,
    pub sma50: IndicatorSeries<f64>,
    pub sma200: IndicatorSeries<f64>,
    pub ema12: IndicatorSeries<f64>,
    pub ema26: IndicatorSeries<f64>,
    pub rsi14: IndicatorSeries<f64>,
    pub macd: IndicatorSeries<MacdPoint>,
    pub bollinger: IndicatorSeries<BollingerPoint>,
    pub vwap20: IndicatorSeries<f64>,
    pub atr14: IndicatorSeries<f64>,
    /// Only set when there were enough bars to classify
    pub trend: Option<TrendType>,
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn sma(&self, bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
        sma(bars, period)
    }

    pub fn ema(&self, bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
        ema(bars, period)
    }

    pub fn rsi(&self, bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
        rsi(bars, period)
    }

    pub fn macd(
        &self,
        bars: &[PriceBar],
        fast: usize,
        slow: usize,
        signal: usize,
    ) -> IndicatorSeries<MacdPoint> {
        macd(bars, fast, slow, signal)
    }

    pub fn bollinger_bands(
        &self,
        bars: &[PriceBar],
        period: usize,
        k: f64,
    ) -> IndicatorSeries<BollingerPoint> {
        bollinger_bands(bars, period, k)
    }

    pub fn vwap(&self, bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
        vwap(bars, period)
    }

    pub fn atr(&self, bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
        atr(bars, period)
    }

    /// Compute the whole bundle; `None` for an empty series
    pub fn calculate_all(&self, bars: &[PriceBar]) -> Option<IndicatorSet> {
        if bars.is_empty() {
            warn!("No price bars supplied, skipping indicator calculation");
            return None;
        }

        let trend = (bars.len() >= MIN_TREND_BARS).then(|| TrendDetector::new().detect_trend(bars));

        Some(IndicatorSet {
            sma20: sma(bars, 20),
            sma50: sma(bars, 50),
            sma200: sma(bars, 200),
            ema12: ema(bars, 12),
            ema26: ema(bars, 26),
            rsi14: rsi(bars, 14),
            macd: macd(bars, 12, 26, 9),
            bollinger: bollinger_bands(bars, 20, 2.0),
            vwap20: vwap(bars, 20),
            atr14: atr(bars, 14),
            trend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bars_from_closes, thirty_bar_fixture};

    #[test]
    fn test_calculate_all_empty() {
        assert!(IndicatorEngine::new().calculate_all(&[]).is_none());
    }

    #[test]
    fn test_calculate_all_short_history() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0]);
        let set = IndicatorEngine::new().calculate_all(&bars).unwrap();
        assert!(set.sma20.is_empty());
        assert!(set.rsi14.is_empty());
        assert!(set.trend.is_none());
    }

    #[test]
    fn test_calculate_all_thirty_bars() {
        let set = IndicatorEngine::new().calculate_all(&thirty_bar_fixture()).unwrap();

        assert_eq!(set.sma20.len(), 11);
        assert_eq!(set.rsi14.len(), 16);
        assert_eq!(set.atr14.len(), 17);
        assert!(set.sma50.is_empty());
        assert!(set.sma200.is_empty());
        assert!(set.macd.is_empty());
        assert_eq!(set.trend, Some(TrendType::Uptrend));
    }
}
