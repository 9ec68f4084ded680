//! Bar fixtures shared by unit tests

use crate::models::PriceBar;
use chrono::{Duration, NaiveDate};

pub(crate) fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// One bar per calendar day starting 2024-01-01; high/low one unit around the close
pub(crate) fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let date = start_date() + Duration::days(i as i64);
            PriceBar::new(date, close, close + 1.0, close - 1.0, close, 1_000)
        })
        .collect()
}

/// Closes of the 30-bar fixture, oldest first
pub(crate) const THIRTY_BAR_CLOSES: [f64; 30] = [
    100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 106.0, 107.0, 108.0, 109.0,
    110.0, 111.0, 112.0, 113.0, 114.0, 115.0, 116.0, 117.0, 118.0, 119.0,
    120.0, 121.0, 122.0, 123.0, 124.0, 125.0, 126.0, 127.0, 128.0, 129.0,
];

/// The 30-bar series used by the end-to-end analysis tests
///
/// An unambiguous uptrend over the trailing 20 bars. Opens sit 0.5 below the
/// close, highs 1.0 above and lows 1.5 below; volume grows 10,000 per day.
pub(crate) fn thirty_bar_fixture() -> Vec<PriceBar> {
    THIRTY_BAR_CLOSES
        .iter()
        .zip(0_u64..)
        .map(|(&close, i)| {
            let date = start_date() + Duration::days(i as i64);
            PriceBar::new(date, close - 0.5, close + 1.0, close - 1.5, close, 1_000_000 + 10_000 * i)
        })
        .collect()
}
