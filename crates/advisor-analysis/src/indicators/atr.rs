//! Average True Range

use super::IndicatorSeries;
use super::moving_average::{has_enough, mean};
use crate::models::{PriceBar, sorted_by_date};

/// ATR with Wilder smoothing, first value at index `period - 1`
pub fn atr(bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
    let mut series = IndicatorSeries::new(format!("ATR{period}"));
    if !has_enough(bars.len(), period) {
        return series;
    }

    let sorted = sorted_by_date(bars);
    let ranges = true_ranges(&sorted);

    let p = period as f64;
    let mut current = mean(ranges[..period].iter().copied());
    series.insert(sorted[period - 1].date, current);

    for (bar, tr) in sorted.iter().zip(&ranges).skip(period) {
        current = (current * (p - 1.0) + tr) / p;
        series.insert(bar.date, current);
    }

    series
}

/// True range per bar; the first bar has no previous close and uses high - low
fn true_ranges(sorted: &[PriceBar]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(sorted.len());
    if let Some(first) = sorted.first() {
        ranges.push(first.range());
    }

    for pair in sorted.windows(2) {
        let (prev, bar) = (&pair[0], &pair[1]);
        let tr = bar
            .range()
            .max((bar.high - prev.close).abs())
            .max((bar.low - prev.close).abs());
        ranges.push(tr);
    }
    ranges
}
