//! Prompt building and parsing of free-text advice
//!
//! The synthesizer is the only place that knows how advice text is shaped: it
//! writes the prompt sent to the text generator and reduces the reply to a
//! recommendation keyword plus a confidence score.

use crate::models::StockSnapshot;
use crate::trend::TrendType;
use serde::{Deserialize, Serialize};
use std::fmt;

const BASE_CONFIDENCE: f64 = 0.5;
const MIN_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;

/// Word groups checked in order; only the first group that matches applies
const POSITIVE_LADDER: &[(&[&str], f64)] = &[
    (&["strongly", "definitely", "certainly", "highly"], 0.3),
    (&["recommend", "suggest", "advise"], 0.2),
    (&["consider", "might", "could"], 0.1),
];

const NEGATIVE_LADDER: &[(&[&str], f64)] = &[
    (&["uncertain", "unclear", "risky", "doubt"], -0.2),
    (&["caution", "careful", "wait"], -0.1),
];

const SYSTEM_PROMPT: &str = "You are a professional financial advisor specialized in stock market analysis. \
Provide concise, actionable advice based on the provided data. \
Your response should include a clear BUY, SELL, or HOLD recommendation, \
along with a brief rationale that a trader can understand quickly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Sell => "SELL",
            Recommendation::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendation: Recommendation,
    /// Always within [0.1, 0.95]
    pub confidence_score: f64,
}

/// One line of the prompt's indicator block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub name: String,
    pub value: f64,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

impl IndicatorReading {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            signal: None,
            histogram: None,
        }
    }

    pub fn with_signal(mut self, signal: f64, histogram: f64) -> Self {
        self.signal = Some(signal);
        self.histogram = Some(histogram);
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AdvisorySynthesizer;

impl AdvisorySynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Persona sent as the system message
    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    /// Deterministic user prompt for one symbol
    pub fn build_prompt(
        &self,
        snapshot: &StockSnapshot,
        trend: TrendType,
        indicators: &[IndicatorReading],
    ) -> String {
        let mut prompt = format!(
            "Please analyze {} ({}) which is currently showing a {} trend. ",
            snapshot.display_name(),
            snapshot.symbol,
            trend.as_str().to_lowercase()
        );

        prompt.push_str(&format!(
            "Current price: ${:.2}, Previous close: ${:.2}, Day change: {:.2}%.\n\n",
            snapshot.current_price, snapshot.previous_close, snapshot.day_change_percent
        ));

        prompt.push_str("Technical indicators:\n");
        for reading in indicators {
            prompt.push_str(&format!("- {}: {:.2}", reading.name, reading.value));
            // Only MACD carries a signal line
            if reading.name == "MACD" {
                if let Some(signal) = reading.signal {
                    prompt.push_str(&format!(", Signal: {signal:.2}"));
                }
                if let Some(histogram) = reading.histogram {
                    prompt.push_str(&format!(", Histogram: {histogram:.2}"));
                }
            }
            prompt.push('\n');
        }

        prompt.push_str("\nBased on this information, please provide:\n");
        prompt.push_str("1. A brief analysis of the current situation (2-3 sentences)\n");
        prompt.push_str("2. A clear recommendation: BUY, SELL, or HOLD\n");
        prompt.push_str("3. A brief rationale for your recommendation (2-3 sentences)\n");
        prompt.push_str("4. One key risk factor to consider\n");
        prompt
    }

    /// Case-insensitive keyword scan; BUY beats SELL, anything else is HOLD
    pub fn extract_recommendation(&self, text: Option<&str>) -> Recommendation {
        let Some(text) = text else {
            return Recommendation::Hold;
        };

        let upper = text.to_uppercase();
        if upper.contains("BUY") {
            Recommendation::Buy
        } else if upper.contains("SELL") {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        }
    }

    /// Confidence from hedging and assertive vocabulary, clamped to [0.1, 0.95]
    ///
    /// The positive and negative ladders are applied independently and added.
    pub fn calculate_confidence(&self, text: Option<&str>) -> f64 {
        let Some(text) = text else {
            return BASE_CONFIDENCE;
        };

        let lower = text.to_lowercase();
        let confidence =
            BASE_CONFIDENCE + ladder_delta(&lower, POSITIVE_LADDER) + ladder_delta(&lower, NEGATIVE_LADDER);
        confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }

    pub fn synthesize(&self, text: Option<&str>) -> RecommendationResult {
        RecommendationResult {
            recommendation: self.extract_recommendation(text),
            confidence_score: self.calculate_confidence(text),
        }
    }
}

fn ladder_delta(lower: &str, ladder: &[(&[&str], f64)]) -> f64 {
    ladder
        .iter()
        .find(|(words, _)| words.iter().any(|word| lower.contains(word)))
        .map_or(0.0, |(_, delta)| *delta)
}
