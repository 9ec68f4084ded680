//! Stock advisor CLI
//!
//! # Usage
//!
//! ```bash
//! # Point the text generator at any OpenAI-compatible endpoint
//! export OPENAI_API_BASE="http://localhost:1234/v1"
//! export OPENAI_MODEL="your-model-name"
//!
//! cargo run --bin stock-advisor -- analyze AAPL MSFT
//! cargo run --bin stock-advisor -- --range 6mo indicators NVDA
//! cargo run --bin stock-advisor -- regime AAPL MSFT GOOGL AMZN
//! ```

use advisor_analysis::{
    AdvisorConfig, AlphaVantageClient, AnalysisOrchestrator, AnalysisScheduler, ApiRateLimiter,
    BatchReport, DataProvider, HistoryRange, IndicatorEngine, LlmTextGenerator,
    MemoryAnalysisSink, PriceBar, SeriesProvider, TrendDetector, YahooFinanceClient,
};
use advisor_llm::providers::{OpenAIConfig, OpenAIProvider};
use advisor_utils::{LogFormat, init_tracing};
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-advisor")]
#[command(about = "Technical analysis and trading advice for stocks", long_about = None)]
struct Args {
    /// Price data provider (yahoo, alpha-vantage)
    #[arg(long, global = true)]
    provider: Option<DataProvider>,

    /// History window (1mo, 3mo, 6mo, 1y, 2y)
    #[arg(long, global = true)]
    range: Option<HistoryRange>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a recommendation for each symbol
    Analyze {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Latest indicator values, trend and breakout flag
    Indicators { symbol: String },
    /// Majority trend across symbols
    Regime {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(
        LogFormat::from_json_flag(args.json_logs),
        "warn,advisor_analysis=info",
    );

    let mut config = AdvisorConfig::default()
        .with_env()
        .context("Failed to read configuration from the environment")?;
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if let Some(range) = args.range {
        config.history_range = range;
    }
    config.validate()?;

    info!(provider = %config.provider, range = %config.history_range, "Starting stock-advisor");

    let provider = series_provider(&config)?;

    match args.command {
        Command::Analyze { symbols } => analyze(&config, provider, &symbols).await,
        Command::Indicators { symbol } => indicators(&config, provider.as_ref(), &symbol).await,
        Command::Regime { symbols } => regime(&config, provider.as_ref(), &symbols).await,
    }
}

fn series_provider(config: &AdvisorConfig) -> anyhow::Result<Arc<dyn SeriesProvider>> {
    let limiter = ApiRateLimiter::new(config.requests_per_minute)?;

    let provider: Arc<dyn SeriesProvider> = match config.provider {
        DataProvider::Yahoo => Arc::new(YahooFinanceClient::new(limiter)),
        DataProvider::AlphaVantage => {
            let key = config
                .alpha_vantage_api_key
                .clone()
                .context("ALPHA_VANTAGE_API_KEY is not set")?;
            Arc::new(AlphaVantageClient::new(key, limiter, config.request_timeout())?)
        }
    };
    Ok(provider)
}

fn text_generator(config: &AdvisorConfig) -> anyhow::Result<LlmTextGenerator> {
    // Local OpenAI-compatible servers accept any key
    let api_key = config
        .openai_api_key
        .clone()
        .unwrap_or_else(|| "not-needed".to_string());

    let mut openai = OpenAIConfig::new(api_key).with_timeout(config.request_timeout_secs);
    if let Some(base) = &config.openai_api_base {
        openai = openai.with_api_base(base.clone());
    }

    let provider = Arc::new(OpenAIProvider::with_config(openai)?);
    Ok(LlmTextGenerator::from_config(provider, config))
}

async fn analyze(
    config: &AdvisorConfig,
    provider: Arc<dyn SeriesProvider>,
    symbols: &[String],
) -> anyhow::Result<()> {
    let generator = Arc::new(text_generator(config)?);
    let orchestrator = AnalysisOrchestrator::new(provider, generator, config.bar_cache_ttl())
        .with_range(config.history_range);

    let sink = Arc::new(MemoryAnalysisSink::new());
    let scheduler = AnalysisScheduler::from_config(Arc::new(orchestrator), sink, config);

    // An explicit request runs even on weekends
    let report = scheduler.run_batch(symbols).await;
    print_report(&report);

    if report.completed.is_empty() && !report.failed.is_empty() {
        anyhow::bail!("All {} analyses failed", report.failed.len());
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    if !report.completed.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec![
            "Symbol",
            "Trend",
            "Recommendation",
            "Confidence",
            "Generated",
        ]);
        for record in &report.completed {
            table.add_row(vec![
                record.symbol.clone(),
                record.trend.to_string(),
                record.recommendation.to_string(),
                format!("{:.2}", record.confidence_score),
                record.timestamp.format("%Y-%m-%d %H:%M UTC").to_string(),
            ]);
        }
        println!("{table}");

        for record in &report.completed {
            println!("\n{}:\n{}", record.symbol, record.rationale.trim());
        }
    }

    if !report.failed.is_empty() {
        println!("\nFailed:");
        for failure in &report.failed {
            println!("  {}: {}", failure.symbol, failure.error);
        }
    }
}

async fn fetch_bars(
    config: &AdvisorConfig,
    provider: &dyn SeriesProvider,
    symbol: &str,
) -> anyhow::Result<(String, Vec<PriceBar>)> {
    let symbol = symbol.trim().to_uppercase();
    let bars = provider
        .get_bars(&symbol, config.history_range)
        .await
        .with_context(|| format!("Failed to fetch bars for {symbol} from {}", provider.name()))?;
    Ok((symbol, bars))
}

async fn indicators(
    config: &AdvisorConfig,
    provider: &dyn SeriesProvider,
    symbol: &str,
) -> anyhow::Result<()> {
    let (symbol, bars) = fetch_bars(config, provider, symbol).await?;
    let set = IndicatorEngine::new()
        .calculate_all(&bars)
        .with_context(|| format!("No price data for {symbol}"))?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Indicator", "Latest"]);

    let scalars = [
        ("SMA (20)", &set.sma20),
        ("SMA (50)", &set.sma50),
        ("SMA (200)", &set.sma200),
        ("EMA (12)", &set.ema12),
        ("EMA (26)", &set.ema26),
        ("RSI (14)", &set.rsi14),
        ("VWAP (20)", &set.vwap20),
        ("ATR (14)", &set.atr14),
    ];
    for (name, series) in scalars {
        table.add_row(vec![name.to_string(), latest_or_dash(series.latest_value().copied())]);
    }

    match set.macd.latest_value() {
        Some(point) => table.add_row(vec![
            "MACD (12,26,9)".to_string(),
            format!(
                "{:.2} / signal {:.2} / hist {:.2}",
                point.macd_line, point.signal_line, point.histogram
            ),
        ]),
        None => table.add_row(vec!["MACD (12,26,9)".to_string(), "-".to_string()]),
    };

    match set.bollinger.latest_value() {
        Some(point) => table.add_row(vec![
            "Bollinger (20,2)".to_string(),
            format!(
                "{:.2} / {:.2} / {:.2}",
                point.lower_band, point.middle_band, point.upper_band
            ),
        ]),
        None => table.add_row(vec!["Bollinger (20,2)".to_string(), "-".to_string()]),
    };

    let trend = set
        .trend
        .map_or_else(|| "insufficient data".to_string(), |t| t.to_string());
    let breakout = TrendDetector::new().detect_breakout(&bars);

    println!("{symbol} ({} bars, {})", bars.len(), config.history_range);
    println!("{table}");
    println!("Trend: {trend}");
    println!("Breakout: {}", if breakout { "yes" } else { "no" });
    Ok(())
}

fn latest_or_dash(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

async fn regime(
    config: &AdvisorConfig,
    provider: &dyn SeriesProvider,
    symbols: &[String],
) -> anyhow::Result<()> {
    let fetched = futures::future::try_join_all(
        symbols
            .iter()
            .map(|symbol| fetch_bars(config, provider, symbol)),
    )
    .await?;

    let detector = TrendDetector::new();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Symbol", "Trend"]);
    for (symbol, bars) in &fetched {
        table.add_row(vec![symbol.clone(), detector.detect_trend(bars).to_string()]);
    }

    let series: HashMap<String, Vec<PriceBar>> = fetched.into_iter().collect();
    let regime = detector.detect_market_regime(&series);

    println!("{table}");
    println!("Market regime: {regime}");
    Ok(())
}
