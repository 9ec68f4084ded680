//! Relative Strength Index with Wilder smoothing

use super::IndicatorSeries;
use super::moving_average::{closes, has_enough};
use crate::models::PriceBar;

/// Floor applied to the average loss so a loss-free window stays finite
const MIN_AVERAGE_LOSS: f64 = 0.001;

/// RSI over closing prices, first value at index `period`
///
/// The first average gain/loss is the simple mean of the first `period`
/// deltas; later ones use `(prev * (period - 1) + current) / period`.
/// Values are in `[0, 100]`.
pub fn rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries<f64> {
    let mut series = IndicatorSeries::new(format!("RSI{period}"));
    if !has_enough(bars.len(), period) {
        return series;
    }

    let closes = closes(bars);
    let deltas: Vec<(f64, f64)> = closes
        .windows(2)
        .map(|pair| {
            let change = pair[1].1 - pair[0].1;
            (change.max(0.0), (-change).max(0.0))
        })
        .collect();

    let p = period as f64;
    let mut avg_gain = deltas[..period].iter().map(|(g, _)| g).sum::<f64>() / p;
    let mut avg_loss = deltas[..period].iter().map(|(_, l)| l).sum::<f64>() / p;
    series.insert(closes[period].0, rsi_value(avg_gain, avg_loss));

    for (i, &(gain, loss)) in deltas.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        // deltas[i] ends at closes[i + 1]
        series.insert(closes[i + 1].0, rsi_value(avg_gain, avg_loss));
    }

    series
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = avg_gain / avg_loss.max(MIN_AVERAGE_LOSS);
    100.0 - 100.0 / (1.0 + rs)
}
