//! Moving Average Convergence Divergence

use super::IndicatorSeries;
use super::moving_average::{closes, ema_points, has_enough};
use crate::models::PriceBar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

/// MACD(fast, slow, signal)
///
/// The MACD line is EMA(fast) - EMA(slow) on the dates both exist, the signal
/// line is an EMA of that line, and only dates carrying all three values are
/// emitted. Any zero period gives an empty series, as does a MACD line too
/// short to seed the signal EMA.
pub fn macd(bars: &[PriceBar], fast: usize, slow: usize, signal: usize) -> IndicatorSeries<MacdPoint> {
    let name = format!("MACD({fast},{slow},{signal})");
    if fast == 0 || slow == 0 || signal == 0 || !has_enough(bars.len(), fast.max(slow)) {
        return IndicatorSeries::empty(name);
    }

    let closes = closes(bars);
    let fast_ema: BTreeMap<_, _> = ema_points(&closes, fast).into_iter().collect();
    let slow_ema = ema_points(&closes, slow);

    let line: Vec<_> = slow_ema
        .iter()
        .filter_map(|(date, slow_value)| {
            fast_ema.get(date).map(|fast_value| (*date, fast_value - slow_value))
        })
        .collect();

    if !has_enough(line.len(), signal) {
        return IndicatorSeries::empty(name);
    }

    let line_by_date: BTreeMap<_, _> = line.iter().copied().collect();
    ema_points(&line, signal)
        .into_iter()
        .filter_map(|(date, signal_line)| {
            line_by_date.get(&date).map(|macd_line| {
                (
                    date,
                    MacdPoint {
                        macd_line: *macd_line,
                        signal_line,
                        histogram: macd_line - signal_line,
                    },
                )
            })
        })
        .collect::<IndicatorSeries<_>>()
        .named(name)
}
