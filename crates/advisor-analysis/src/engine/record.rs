//! Analysis record produced for each symbol

use crate::advisory::{Recommendation, RecommendationResult};
use crate::trend::TrendType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub symbol: String,
    pub trend: TrendType,
    pub recommendation: Recommendation,
    /// Rounded to two decimals
    pub confidence_score: f64,
    /// The advice text as returned by the text generator
    pub rationale: String,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(
        symbol: impl Into<String>,
        trend: TrendType,
        result: RecommendationResult,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            trend,
            recommendation: result.recommendation,
            confidence_score: round_confidence(result.confidence_score),
            rationale: rationale.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Two decimals, halves rounded away from zero
pub(crate) fn round_confidence(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
