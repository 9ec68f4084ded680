//! Trend classification, market regime and breakout detection

use crate::indicators::bollinger::population_std_dev;
use crate::indicators::moving_average::mean;
use crate::models::{PriceBar, sorted_by_date};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Bars needed before a trend is classified
pub const MIN_TREND_BARS: usize = 20;
/// Bars needed before breakout detection runs
pub const MIN_BREAKOUT_BARS: usize = 10;

const STRONG_MOMENTUM: f64 = 0.02;
const FLAT_MOMENTUM: f64 = 0.01;
const LOW_VOLATILITY: f64 = 0.02;
const VOLUME_SPIKE_RATIO: f64 = 1.5;
const PRICE_BREAKOUT_CHANGE: f64 = 0.02;
const RANGE_EXPANSION_RATIO: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendType {
    Uptrend,
    Downtrend,
    Sideways,
}

impl TrendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendType::Uptrend => "UPTREND",
            TrendType::Downtrend => "DOWNTREND",
            TrendType::Sideways => "SIDEWAYS",
        }
    }
}

impl fmt::Display for TrendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic trend detector over daily closes
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendDetector;

impl TrendDetector {
    pub fn new() -> Self {
        Self
    }

    /// Classify the trailing 20 bars, using SMA20/SMA50 position and momentum
    ///
    /// Fewer than 20 bars is SIDEWAYS.
    pub fn detect_trend(&self, bars: &[PriceBar]) -> TrendType {
        if bars.len() < MIN_TREND_BARS {
            warn!(
                bars = bars.len(),
                "Not enough bars to classify trend, defaulting to SIDEWAYS"
            );
            return TrendType::Sideways;
        }

        let sorted = sorted_by_date(bars);
        let recent = &sorted[sorted.len() - MIN_TREND_BARS..];

        let above20 = is_above_sma(&sorted, 20);
        let above50 = is_above_sma(&sorted, 50);
        let momentum = momentum(recent);
        let volatility = volatility(recent);

        debug!(above20, above50, momentum, volatility, "Trend inputs");

        if above20 && above50 && momentum > STRONG_MOMENTUM {
            TrendType::Uptrend
        } else if !above20 && !above50 && momentum < -STRONG_MOMENTUM {
            TrendType::Downtrend
        } else if momentum.abs() < FLAT_MOMENTUM && volatility < LOW_VOLATILITY {
            TrendType::Sideways
        } else if momentum > 0.0 {
            TrendType::Uptrend
        } else {
            TrendType::Downtrend
        }
    }

    /// Majority trend across symbols
    ///
    /// A class wins only with a count strictly greater than both others; ties
    /// and an empty map are SIDEWAYS.
    pub fn detect_market_regime<S>(&self, series: &HashMap<S, Vec<PriceBar>>) -> TrendType {
        let (mut up, mut down, mut sideways) = (0_usize, 0_usize, 0_usize);
        for bars in series.values() {
            match self.detect_trend(bars) {
                TrendType::Uptrend => up += 1,
                TrendType::Downtrend => down += 1,
                TrendType::Sideways => sideways += 1,
            }
        }

        if up > down && up > sideways {
            TrendType::Uptrend
        } else if down > up && down > sideways {
            TrendType::Downtrend
        } else {
            TrendType::Sideways
        }
    }

    /// True only when the last bar shows a volume spike, a >2% move and an
    /// expanded range at once
    pub fn detect_breakout(&self, bars: &[PriceBar]) -> bool {
        if bars.len() < MIN_BREAKOUT_BARS {
            return false;
        }

        let sorted = sorted_by_date(bars);
        let n = sorted.len();
        let last = &sorted[n - 1];
        let prev = &sorted[n - 2];

        let prior_volume = mean(sorted[n - 10..n - 1].iter().map(|bar| bar.volume as f64));
        let volume_spike = last.volume as f64 > VOLUME_SPIKE_RATIO * prior_volume;

        let price_breakout = prev.close != 0.0
            && ((last.close - prev.close) / prev.close).abs() > PRICE_BREAKOUT_CHANGE;

        let average_range = mean(sorted[n - 10..].iter().map(PriceBar::range));
        let range_expansion = last.range() > RANGE_EXPANSION_RATIO * average_range;

        debug!(volume_spike, price_breakout, range_expansion, "Breakout checks");
        volume_spike && price_breakout && range_expansion
    }
}

/// Last close strictly above the mean of the trailing `period` closes
fn is_above_sma(sorted: &[PriceBar], period: usize) -> bool {
    if period == 0 || sorted.len() < period {
        return false;
    }
    let window = &sorted[sorted.len() - period..];
    let average = mean(window.iter().map(|bar| bar.close));
    window[period - 1].close > average
}

fn momentum(recent: &[PriceBar]) -> f64 {
    match (recent.first(), recent.last()) {
        (Some(first), Some(last)) if recent.len() >= 2 && first.close != 0.0 => {
            (last.close - first.close) / first.close
        }
        _ => 0.0,
    }
}

fn volatility(recent: &[PriceBar]) -> f64 {
    let average = mean(recent.iter().map(|bar| bar.close));
    if average == 0.0 {
        return 0.0;
    }
    population_std_dev(recent.iter().map(|bar| bar.close), average) / average
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bars_from_closes, start_date, thirty_bar_fixture};
    use chrono::Duration;

    fn linear(n: i32, start: f64, step: f64) -> Vec<PriceBar> {
        let closes: Vec<f64> = (0..n).map(|i| start + step * f64::from(i)).collect();
        bars_from_closes(&closes)
    }

    #[test]
    fn test_short_series_is_sideways() {
        let detector = TrendDetector::new();
        assert_eq!(detector.detect_trend(&linear(19, 100.0, 5.0)), TrendType::Sideways);
        assert_eq!(detector.detect_trend(&[]), TrendType::Sideways);
    }

    #[test]
    fn test_monotonic_rise_is_uptrend() {
        let detector = TrendDetector::new();
        assert_eq!(detector.detect_trend(&linear(25, 100.0, 1.0)), TrendType::Uptrend);
        assert_eq!(detector.detect_trend(&linear(60, 100.0, 1.0)), TrendType::Uptrend);
    }

    #[test]
    fn test_gentle_rise_with_low_volatility_is_uptrend() {
        let bars = linear(25, 100.0, 0.15);
        let recent = &bars[bars.len() - MIN_TREND_BARS..];
        assert!(volatility(recent) < LOW_VOLATILITY);
        assert!(momentum(recent) > STRONG_MOMENTUM);

        assert_eq!(TrendDetector::new().detect_trend(&bars), TrendType::Uptrend);
    }

    #[test]
    fn test_monotonic_fall_is_downtrend() {
        let detector = TrendDetector::new();
        assert_eq!(detector.detect_trend(&linear(60, 200.0, -1.0)), TrendType::Downtrend);
        assert_eq!(detector.detect_trend(&linear(25, 200.0, -1.0)), TrendType::Downtrend);
    }

    #[test]
    fn test_flat_series_is_sideways() {
        let detector = TrendDetector::new();
        assert_eq!(detector.detect_trend(&linear(30, 100.0, 0.0)), TrendType::Sideways);
    }

    #[test]
    fn test_unsorted_input() {
        let mut bars = linear(25, 100.0, 1.0);
        bars.reverse();
        assert_eq!(TrendDetector::new().detect_trend(&bars), TrendType::Uptrend);
    }

    #[test]
    fn test_fixture_trend() {
        // SMA50 unavailable, so the momentum fallback decides
        assert_eq!(
            TrendDetector::new().detect_trend(&thirty_bar_fixture()),
            TrendType::Uptrend
        );
    }

    #[test]
    fn test_market_regime() {
        let detector = TrendDetector::new();

        let mut map = HashMap::new();
        assert_eq!(detector.detect_market_regime::<&str>(&map), TrendType::Sideways);

        map.insert("A", linear(25, 100.0, 1.0));
        map.insert("B", linear(25, 100.0, 1.0));
        map.insert("C", linear(25, 200.0, -1.0));
        assert_eq!(detector.detect_market_regime(&map), TrendType::Uptrend);

        map.insert("D", linear(25, 200.0, -1.0));
        assert_eq!(detector.detect_market_regime(&map), TrendType::Sideways);

        map.insert("E", linear(25, 200.0, -1.0));
        assert_eq!(detector.detect_market_regime(&map), TrendType::Downtrend);
    }

    fn breakout_series(last_volume: u64, last_close: f64, last_range: f64) -> Vec<PriceBar> {
        let mut bars: Vec<PriceBar> = (0..9_i64)
            .map(|i| {
                PriceBar::new(start_date() + Duration::days(i), 100.0, 101.0, 99.0, 100.0, 1_000)
            })
            .collect();
        bars.push(PriceBar::new(
            start_date() + Duration::days(9),
            100.0,
            last_close.max(100.0) + last_range / 2.0,
            last_close.max(100.0) - last_range / 2.0,
            last_close,
            last_volume,
        ));
        bars
    }

    #[test]
    fn test_breakout_all_conditions() {
        let bars = breakout_series(2_000, 103.0, 6.0);
        assert!(TrendDetector::new().detect_breakout(&bars));
    }

    #[test]
    fn test_breakout_requires_all_three() {
        let detector = TrendDetector::new();
        // no volume spike
        assert!(!detector.detect_breakout(&breakout_series(1_200, 103.0, 6.0)));
        // price moved less than 2%
        assert!(!detector.detect_breakout(&breakout_series(2_000, 101.0, 6.0)));
        // range not expanded
        assert!(!detector.detect_breakout(&breakout_series(2_000, 103.0, 2.0)));
    }

    #[test]
    fn test_breakout_needs_ten_bars() {
        let bars = breakout_series(2_000, 103.0, 6.0);
        assert!(!TrendDetector::new().detect_breakout(&bars[1..]));
    }
}
