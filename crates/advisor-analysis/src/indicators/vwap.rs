//! Rolling volume-weighted average price

use super::IndicatorSeries;
use super::moving_average::has_enough;
use crate::models::{PriceBar, sorted_by_date};

/// VWAP over each trailing window of `period` bars, using the typical price
///
/// A window with no volume divides by 1 instead of 0.
pub fn vwap(bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
    let mut series = IndicatorSeries::new(format!("VWAP{period}"));
    if !has_enough(bars.len(), period) {
        return series;
    }

    for window in sorted_by_date(bars).windows(period) {
        let weighted: f64 = window
            .iter()
            .map(|bar| bar.typical_price() * bar.volume as f64)
            .sum();
        let volume: f64 = window.iter().map(|bar| bar.volume as f64).sum();
        series.insert(window[period - 1].date, weighted / volume.max(1.0));
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::start_date;
    use chrono::Duration;

    fn bar(day: i64, high: f64, low: f64, close: f64, volume: u64) -> PriceBar {
        PriceBar::new(start_date() + Duration::days(day), close, high, low, close, volume)
    }

    #[test]
    fn test_vwap_weights_by_volume() {
        let bars = vec![
            bar(0, 11.0, 9.0, 10.0, 100),
            bar(1, 21.0, 19.0, 20.0, 300),
            bar(2, 31.0, 29.0, 30.0, 100),
        ];
        let series = vwap(&bars, 2);

        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        // (10*100 + 20*300) / 400 and (20*300 + 30*100) / 400
        assert!((values[0] - 17.5).abs() < 1e-9);
        assert!((values[1] - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_vwap_zero_volume() {
        let bars = vec![
            bar(0, 11.0, 9.0, 10.0, 0),
            bar(1, 11.0, 9.0, 10.0, 0),
            bar(2, 11.0, 9.0, 10.0, 0),
        ];
        let series = vwap(&bars, 2);
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|(_, v)| v.abs() < 1e-12));
    }

    #[test]
    fn test_vwap_huge_volumes_do_not_overflow() {
        let volume = u64::MAX / 2 + 1;
        let bars = vec![
            bar(0, 11.0, 9.0, 10.0, volume),
            bar(1, 11.0, 9.0, 10.0, volume),
            bar(2, 11.0, 9.0, 10.0, volume),
        ];
        let series = vwap(&bars, 2);
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|(_, v)| (v - 10.0).abs() < 1e-6));
    }

    #[test]
    fn test_vwap_insufficient_data() {
        let bars = vec![bar(0, 11.0, 9.0, 10.0, 100)];
        assert!(vwap(&bars, 1).is_empty());
    }
}
