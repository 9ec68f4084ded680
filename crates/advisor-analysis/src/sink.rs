//! Consumers of finished analysis records

use crate::engine::AnalysisRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Persists finished analysis records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    async fn persist(&self, record: AnalysisRecord) -> Result<()>;
}

/// In-memory sink, records kept in insertion order
#[derive(Debug, Default, Clone)]
pub struct MemoryAnalysisSink {
    records: Arc<RwLock<Vec<AnalysisRecord>>>,
}

impl MemoryAnalysisSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently persisted record for `symbol`
    pub async fn latest(&self, symbol: &str) -> Option<AnalysisRecord> {
        let records = self.records.read().await;
        records
            .iter()
            .rev()
            .find(|record| record.symbol.eq_ignore_ascii_case(symbol))
            .cloned()
    }

    pub async fn records(&self) -> Vec<AnalysisRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AnalysisSink for MemoryAnalysisSink {
    async fn persist(&self, record: AnalysisRecord) -> Result<()> {
        debug!(symbol = %record.symbol, recommendation = %record.recommendation, "Persisting analysis");
        self.records.write().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::Recommendation;
    use crate::trend::TrendType;
    use chrono::Utc;

    fn record(symbol: &str, recommendation: Recommendation) -> AnalysisRecord {
        AnalysisRecord {
            symbol: symbol.to_string(),
            trend: TrendType::Sideways,
            recommendation,
            confidence_score: 0.5,
            rationale: "n/a".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_latest_returns_last_inserted() {
        let sink = MemoryAnalysisSink::new();
        assert!(sink.latest("AAPL").await.is_none());

        sink.persist(record("AAPL", Recommendation::Buy)).await.unwrap();
        sink.persist(record("MSFT", Recommendation::Sell)).await.unwrap();
        sink.persist(record("AAPL", Recommendation::Hold)).await.unwrap();

        assert_eq!(sink.len().await, 3);
        let latest = sink.latest("aapl").await.unwrap();
        assert_eq!(latest.recommendation, Recommendation::Hold);
        assert_eq!(
            sink.latest("MSFT").await.unwrap().recommendation,
            Recommendation::Sell
        );
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let sink = MemoryAnalysisSink::new();
        let clone = sink.clone();
        clone.persist(record("AAPL", Recommendation::Buy)).await.unwrap();
        assert!(!sink.is_empty().await);
    }
}
