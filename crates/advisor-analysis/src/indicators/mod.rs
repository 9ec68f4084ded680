//! Technical indicators over daily price bars
//!
//! Every function sorts its input by date, returns an empty series when the
//! input is too short for the period, and never panics on odd values.

pub mod atr;
pub mod bollinger;
pub mod engine;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod series;
pub mod vwap;

pub use atr::atr;
pub use bollinger::{BollingerPoint, bollinger_bands};
pub use engine::{IndicatorEngine, IndicatorSet};
pub use macd::{MacdPoint, macd};
pub use moving_average::{ema, sma};
pub use rsi::rsi;
pub use series::IndicatorSeries;
pub use vwap::vwap;
