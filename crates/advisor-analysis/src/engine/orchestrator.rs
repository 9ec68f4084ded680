//! Per-symbol analysis pipeline

use super::record::AnalysisRecord;
use crate::advisory::{AdvisorySynthesizer, IndicatorReading};
use crate::api::SeriesProvider;
use crate::cache::{BarCache, BarKey};
use crate::error::{AdvisorError, Result};
use crate::generator::TextGenerator;
use crate::indicators::IndicatorEngine;
use crate::models::{HistoryRange, PriceBar, StockSnapshot};
use crate::trend::TrendDetector;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Composes data fetching, indicators, trend and advice into one record
///
/// Cheap to share behind an `Arc`; calls for different symbols are independent.
pub struct AnalysisOrchestrator {
    provider: Arc<dyn SeriesProvider>,
    generator: Arc<dyn TextGenerator>,
    cache: BarCache,
    range: HistoryRange,
    engine: IndicatorEngine,
    detector: TrendDetector,
    synthesizer: AdvisorySynthesizer,
}

impl AnalysisOrchestrator {
    pub fn new(
        provider: Arc<dyn SeriesProvider>,
        generator: Arc<dyn TextGenerator>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            generator,
            cache: BarCache::new(cache_ttl),
            range: HistoryRange::default(),
            engine: IndicatorEngine::new(),
            detector: TrendDetector::new(),
            synthesizer: AdvisorySynthesizer::new(),
        }
    }

    pub fn with_range(mut self, range: HistoryRange) -> Self {
        self.range = range;
        self
    }

    /// Share a bar cache with other components
    pub fn with_cache(mut self, cache: BarCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn range(&self) -> HistoryRange {
        self.range
    }

    /// Fetch data for `symbol` and run the full pipeline
    ///
    /// A blank symbol is `InvalidSymbol`; any collaborator failure is returned
    /// as `AnalysisGenerationFailed` and no record is produced.
    #[instrument(skip(self))]
    pub async fn generate_analysis(&self, symbol: &str) -> Result<AnalysisRecord> {
        let symbol = normalize_symbol(symbol)?;

        let bars = self
            .bars(&symbol)
            .await
            .map_err(|e| AdvisorError::generation_failed(&symbol, e))?;

        let snapshot = self
            .provider
            .get_snapshot(&symbol)
            .await
            .map_err(|e| AdvisorError::generation_failed(&symbol, e))?;

        self.generate_from_bars(&symbol, &bars, &snapshot).await
    }

    /// Run the pipeline over bars and a snapshot that were already fetched
    pub async fn generate_from_bars(
        &self,
        symbol: &str,
        bars: &[PriceBar],
        snapshot: &StockSnapshot,
    ) -> Result<AnalysisRecord> {
        let readings = self.indicator_readings(bars);
        let trend = self.detector.detect_trend(bars);
        debug!(symbol, %trend, readings = readings.len(), "Building advisory prompt");

        let prompt = self.synthesizer.build_prompt(snapshot, trend, &readings);
        let advice = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| AdvisorError::generation_failed(symbol, e))?;

        let result = self.synthesizer.synthesize(Some(&advice));
        let record = AnalysisRecord::new(symbol, trend, result, advice);
        info!(
            symbol,
            trend = %record.trend,
            recommendation = %record.recommendation,
            confidence = record.confidence_score,
            "Analysis generated"
        );
        Ok(record)
    }

    /// Latest RSI14 and MACD(12,26,9), plus SMA20, SMA50 and ATR14
    ///
    /// Indicators without enough history are left out.
    pub fn indicator_readings(&self, bars: &[PriceBar]) -> Vec<IndicatorReading> {
        let mut readings = Vec::new();

        push_latest(&mut readings, "RSI (14)", self.engine.rsi(bars, 14).latest_value().copied());

        match self.engine.macd(bars, 12, 26, 9).latest_value() {
            Some(point) => readings.push(
                IndicatorReading::new("MACD", point.macd_line)
                    .with_signal(point.signal_line, point.histogram),
            ),
            None => warn!(bars = bars.len(), "Not enough data for MACD, omitting it"),
        }

        push_latest(&mut readings, "SMA (20)", self.engine.sma(bars, 20).latest_value().copied());
        push_latest(&mut readings, "SMA (50)", self.engine.sma(bars, 50).latest_value().copied());
        push_latest(&mut readings, "ATR (14)", self.engine.atr(bars, 14).latest_value().copied());

        readings
    }

    async fn bars(&self, symbol: &str) -> Result<Arc<Vec<PriceBar>>> {
        let key = BarKey::new(symbol, self.range);
        self.cache
            .get_or_fetch(key, || self.provider.get_bars(symbol, self.range))
            .await
    }
}

fn push_latest(readings: &mut Vec<IndicatorReading>, name: &str, value: Option<f64>) {
    match value {
        Some(value) => readings.push(IndicatorReading::new(name, value)),
        None => warn!(indicator = name, "Not enough data, omitting indicator"),
    }
}

/// Trimmed, upper-cased ticker
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AdvisorError::InvalidSymbol(
            "symbol must not be empty".to_string(),
        ));
    }
    Ok(symbol)
}
