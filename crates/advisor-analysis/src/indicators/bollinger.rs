//! Bollinger Bands

use super::IndicatorSeries;
use super::moving_average::{closes, has_enough, mean};
use crate::models::PriceBar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerPoint {
    pub middle_band: f64,
    pub upper_band: f64,
    pub lower_band: f64,
}

impl BollingerPoint {
    pub fn width(&self) -> f64 {
        self.upper_band - self.lower_band
    }
}

/// SMA(period) with bands `k` population standard deviations away
pub fn bollinger_bands(bars: &[PriceBar], period: usize, k: f64) -> IndicatorSeries<BollingerPoint> {
    let mut series = IndicatorSeries::new(format!("BB({period},{k})"));
    if !has_enough(bars.len(), period) || k <= 0.0 || k.is_nan() {
        return series;
    }

    for window in closes(bars).windows(period) {
        let middle = mean(window.iter().map(|(_, close)| *close));
        let std_dev = population_std_dev(window.iter().map(|(_, close)| *close), middle);
        series.insert(
            window[period - 1].0,
            BollingerPoint {
                middle_band: middle,
                upper_band: middle + k * std_dev,
                lower_band: middle - k * std_dev,
            },
        );
    }

    series
}

pub(crate) fn population_std_dev(values: impl ExactSizeIterator<Item = f64>, mean: f64) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bars_from_closes;

    #[test]
    fn test_bands_around_middle() {
        let bars = bars_from_closes(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0, 1.0]);
        let series = bollinger_bands(&bars, 8, 2.0);

        assert_eq!(series.len(), 2);
        let (date, first) = series.iter().next().unwrap();
        assert_eq!(*date, bars[7].date);
        // mean 5, population std-dev 2
        assert!((first.middle_band - 5.0).abs() < 1e-12);
        assert!((first.upper_band - 9.0).abs() < 1e-12);
        assert!((first.lower_band - 1.0).abs() < 1e-12);
        assert!((first.width() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_flat_series_has_zero_width() {
        let bars = bars_from_closes(&[10.0; 25]);
        let series = bollinger_bands(&bars, 20, 2.0);
        assert_eq!(series.len(), 6);
        assert!(series.iter().all(|(_, p)| p.width().abs() < 1e-12));
    }

    #[test]
    fn test_invalid_parameters() {
        let bars = bars_from_closes(&[10.0; 20]);
        assert!(bollinger_bands(&bars, 20, 2.0).is_empty());
        assert!(bollinger_bands(&bars, 5, 0.0).is_empty());
        assert!(bollinger_bands(&bars, 5, -1.0).is_empty());
        assert!(bollinger_bands(&bars, 0, 2.0).is_empty());
    }
}
