mod config;
mod error;
mod indicator;
mod model;
mod provider;
mod technicals;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{AppConfig, EngineConfig};
use provider::PriceProvider;
use provider::yahoo::YahooProvider;
use technicals::TechnicalAnalysis;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("provider error")]
    Provider,
    #[display("output error")]
    Output,
    #[display("runtime error")]
    Runtime,
}

#[derive(Parser)]
#[command(
    name = "stock-technicals",
    about = "Technical-indicator report for stock tickers"
)]
struct Cli {
    /// Path to the TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// One or more ticker symbols, e.g. AAPL MSFT
    #[arg(required = true)]
    tickers: Vec<String>,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load(Path::new(path)).change_context(AppError::Config)?,
        None => AppConfig::default(),
    };

    init_tracing(&config);

    let provider: Arc<dyn PriceProvider> = Arc::new(
        YahooProvider::new(&config.provider).change_context(AppError::Provider)?,
    );
    let engine = Arc::new(config.engine);

    // The provider's rate limiter paces requests, so every ticker is spawned at once.
    let mut handles = Vec::with_capacity(cli.tickers.len());
    for ticker in dedup_tickers(&cli.tickers) {
        let provider = Arc::clone(&provider);
        let engine = Arc::clone(&engine);
        let handle = tokio::spawn(async move {
            let analysis = analyze_ticker(provider.as_ref(), &ticker, &engine).await;
            (ticker, analysis)
        });
        handles.push(handle);
    }

    let mut results = BTreeMap::new();
    for handle in handles {
        let (ticker, analysis) = handle.await.change_context(AppError::Runtime)?;
        results.insert(ticker, analysis);
    }

    let unavailable = results.values().filter(|a| a.is_unavailable()).count();
    info!(
        tickers = results.len(),
        unavailable, "analysis complete"
    );

    let output = if cli.pretty {
        serde_json::to_string_pretty(&results)
    } else {
        serde_json::to_string(&results)
    }
    .change_context(AppError::Output)?;
    println!("{output}");

    Ok(())
}

/// Logs go to stderr so stdout carries only the JSON report.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Upper-cases symbols and drops repeats, keeping first-seen order.
fn dedup_tickers(tickers: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let symbol = ticker.trim().to_uppercase();
        if !symbol.is_empty() && !seen.contains(&symbol) {
            seen.push(symbol);
        }
    }
    seen
}

/// Fetch and analyze one ticker. A fetch failure degrades to an empty report.
async fn analyze_ticker(
    provider: &dyn PriceProvider,
    ticker: &str,
    engine: &EngineConfig,
) -> TechnicalAnalysis {
    info!(provider = provider.name(), ticker, "fetching daily history");

    match provider.fetch_daily(ticker).await {
        Ok(series) => {
            let analysis = technicals::analyze(ticker, &series, engine);
            if let Some(report) = analysis.report() {
                let overall = report.overall();
                info!(
                    ticker,
                    "{} ({} BUY, {} SELL)",
                    overall.rating,
                    overall.counts.buy,
                    overall.counts.sell
                );
            }
            analysis
        }
        Err(e) => {
            warn!(
                provider = provider.name(),
                ticker,
                error = ?e,
                "price history unavailable"
            );
            TechnicalAnalysis::Unavailable
        }
    }
}
