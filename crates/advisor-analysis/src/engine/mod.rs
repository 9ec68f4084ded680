//! Analysis orchestration
//!
//! Composes data fetching, indicators, trend detection and advisory synthesis
//! into one analysis record per symbol.

pub mod orchestrator;
pub mod record;

pub use orchestrator::AnalysisOrchestrator;
pub use record::AnalysisRecord;
