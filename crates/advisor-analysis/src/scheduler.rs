//! Batch analysis over many symbols
//!
//! Jobs go through a bounded work queue: at most `concurrency` analyses run at
//! once, and each worker slot pauses for `inter_job_delay` after a job before
//! the next one may take it.

use crate::config::AdvisorConfig;
use crate::engine::{AnalysisOrchestrator, AnalysisRecord};
use crate::sink::AnalysisSink;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// A symbol whose analysis failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSymbol {
    pub symbol: String,
    pub error: String,
}

/// Outcome of one batch
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Records handed to the sink, in input order
    pub completed: Vec<AnalysisRecord>,
    /// Failures in input order
    pub failed: Vec<FailedSymbol>,
}

impl BatchReport {
    /// True when nothing ran, e.g. a skipped batch
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.failed.is_empty()
    }
}

/// Exchange calendar used to decide the trading day
pub const DEFAULT_MARKET_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Weekdays only; there is no holiday calendar
pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Calendar date of `now` on the exchange's wall clock
pub fn market_date(now: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    now.with_timezone(&timezone).date_naive()
}

pub struct AnalysisScheduler {
    orchestrator: Arc<AnalysisOrchestrator>,
    sink: Arc<dyn AnalysisSink>,
    concurrency: usize,
    inter_job_delay: Duration,
    enabled: bool,
    market_timezone: Tz,
}

impl AnalysisScheduler {
    pub fn new(orchestrator: Arc<AnalysisOrchestrator>, sink: Arc<dyn AnalysisSink>) -> Self {
        let defaults = AdvisorConfig::default();
        Self {
            orchestrator,
            sink,
            concurrency: defaults.concurrency,
            inter_job_delay: defaults.inter_job_delay(),
            enabled: defaults.scheduled_updates_enabled,
            market_timezone: DEFAULT_MARKET_TIMEZONE,
        }
    }

    /// Concurrency, delay and the scheduled-updates flag from configuration
    pub fn from_config(
        orchestrator: Arc<AnalysisOrchestrator>,
        sink: Arc<dyn AnalysisSink>,
        config: &AdvisorConfig,
    ) -> Self {
        Self::new(orchestrator, sink)
            .with_concurrency(config.concurrency)
            .with_inter_job_delay(config.inter_job_delay())
            .with_enabled(config.scheduled_updates_enabled)
    }

    /// Worker count, at least 1
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_inter_job_delay(mut self, delay: Duration) -> Self {
        self.inter_job_delay = delay;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Zone whose calendar decides weekends, America/New_York by default
    pub fn with_market_timezone(mut self, timezone: Tz) -> Self {
        self.market_timezone = timezone;
        self
    }

    /// Scheduled entry point for today's date in the market time zone
    pub async fn run(&self, symbols: &[String]) -> BatchReport {
        self.run_on(market_date(Utc::now(), self.market_timezone), symbols)
            .await
    }

    /// Scheduled entry point for a given date
    ///
    /// Skips the batch when scheduled updates are disabled or `date` is a
    /// weekend.
    pub async fn run_on(&self, date: NaiveDate, symbols: &[String]) -> BatchReport {
        if !self.enabled {
            info!("Scheduled updates disabled, skipping batch");
            return BatchReport::default();
        }
        if !is_trading_day(date) {
            info!(%date, "Not a trading day, skipping batch");
            return BatchReport::default();
        }
        self.run_batch(symbols).await
    }

    /// Analyze every distinct symbol now, regardless of date or flag
    pub async fn run_batch(&self, symbols: &[String]) -> BatchReport {
        let jobs = dedupe(symbols);
        info!(
            symbols = jobs.len(),
            concurrency = self.concurrency,
            "Starting analysis batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, symbol) in jobs.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let orchestrator = Arc::clone(&self.orchestrator);
            let sink = Arc::clone(&self.sink);
            let delay = self.inter_job_delay;

            tasks.spawn(async move {
                // The semaphore is never closed
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, symbol, Err("worker pool closed".to_string()));
                };

                let outcome = AssertUnwindSafe(run_job(&orchestrator, sink.as_ref(), &symbol))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err("analysis panicked".to_string()));

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                (index, symbol, outcome)
            });
        }

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        let mut reported = HashSet::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(record))) => {
                    reported.insert(index);
                    completed.push((index, record));
                }
                Ok((index, symbol, Err(error))) => {
                    error!(%symbol, %error, "Analysis failed");
                    reported.insert(index);
                    failed.push((index, FailedSymbol { symbol, error }));
                }
                Err(e) => error!(error = %e, "Analysis task aborted"),
            }
        }

        // Tasks that never returned still show up as failures
        for (index, symbol) in jobs.into_iter().enumerate() {
            if !reported.contains(&index) {
                failed.push((
                    index,
                    FailedSymbol {
                        symbol,
                        error: "analysis task aborted".to_string(),
                    },
                ));
            }
        }

        completed.sort_by_key(|(index, _)| *index);
        failed.sort_by_key(|(index, _)| *index);

        let report = BatchReport {
            completed: completed.into_iter().map(|(_, record)| record).collect(),
            failed: failed.into_iter().map(|(_, failure)| failure).collect(),
        };
        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            "Analysis batch finished"
        );
        report
    }
}

/// Analyze one symbol and hand the record to the sink
async fn run_job(
    orchestrator: &AnalysisOrchestrator,
    sink: &dyn AnalysisSink,
    symbol: &str,
) -> Result<AnalysisRecord, String> {
    let record = orchestrator
        .generate_analysis(symbol)
        .await
        .map_err(|e| e.to_string())?;
    sink.persist(record.clone()).await.map_err(|e| e.to_string())?;
    Ok(record)
}

/// Normalized symbols in first-seen order
fn dedupe(symbols: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for symbol in symbols {
        let normalized = symbol.trim().to_uppercase();
        if normalized.is_empty() {
            warn!("Skipping blank symbol");
            continue;
        }
        if seen.insert(normalized.clone()) {
            unique.push(normalized);
        }
    }
    unique
}
