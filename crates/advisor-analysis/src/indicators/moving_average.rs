//! Simple and exponential moving averages of closing prices

use super::IndicatorSeries;
use crate::models::{PriceBar, sorted_by_date};
use chrono::NaiveDate;

/// Trailing mean of `close`, one value per bar from index `period - 1`
///
/// Empty unless `period > 0` and there are more than `period` bars.
pub fn sma(bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
    let name = format!("SMA{period}");
    if !has_enough(bars.len(), period) {
        return IndicatorSeries::empty(name);
    }

    sma_points(&closes(bars), period).into_iter().collect::<IndicatorSeries<_>>().named(name)
}

/// Exponential moving average seeded with the SMA of the first `period` closes
pub fn ema(bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
    let name = format!("EMA{period}");
    if !has_enough(bars.len(), period) {
        return IndicatorSeries::empty(name);
    }

    ema_points(&closes(bars), period).into_iter().collect::<IndicatorSeries<_>>().named(name)
}

pub(crate) fn has_enough(len: usize, period: usize) -> bool {
    period > 0 && len > period
}

/// Dated closes in ascending date order
pub(crate) fn closes(bars: &[PriceBar]) -> Vec<(NaiveDate, f64)> {
    sorted_by_date(bars).iter().map(|bar| (bar.date, bar.close)).collect()
}

pub(crate) fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

pub(crate) fn sma_points(values: &[(NaiveDate, f64)], period: usize) -> Vec<(NaiveDate, f64)> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    values
        .windows(period)
        .map(|window| {
            let date = window[period - 1].0;
            (date, mean(window.iter().map(|(_, v)| *v)))
        })
        .collect()
}

pub(crate) fn ema_points(values: &[(NaiveDate, f64)], period: usize) -> Vec<(NaiveDate, f64)> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = mean(values[..period].iter().map(|(_, v)| *v));
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push((values[period - 1].0, prev));

    for &(date, value) in &values[period..] {
        prev = (value - prev) * k + prev;
        out.push((date, prev));
    }
    out
}
