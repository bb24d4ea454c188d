//! Funding Ledger CLI
//!
//! `serve` runs the HTTP report server; `report` runs the pipeline once over a
//! local CSV and prints the result as JSON.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use funding_ledger::core::{FundingDocument, FundingReport, MarketSelection, Timeframe};
use funding_ledger_api::{ApiConfig, ApiServer, LoggingConfig};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Bind address, e.g. 127.0.0.1:8787
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Build a report from a local CSV and print it as JSON
    Report {
        /// CSV export to read
        #[arg(short, long)]
        file: String,

        /// Market to include (repeatable)
        #[arg(short, long = "market")]
        markets: Vec<String>,

        /// Include every market found in the file
        #[arg(long)]
        all: bool,

        /// Chart window: day, week, month or all
        #[arg(long)]
        timeframe: Option<Timeframe>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = ApiConfig::load(args.config.as_deref())
        .with_context(|| "failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    let _guard = init_tracing(&config.logging)?;

    match args.command {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Report {
            file,
            markets,
            all,
            timeframe,
            pretty,
        } => report(&file, markets, all, timeframe, pretty),
    }
}

async fn serve(mut config: ApiConfig, bind: Option<SocketAddr>) -> Result<()> {
    if let Some(bind) = bind {
        config.bind_address = bind;
    }

    info!("Starting Funding Ledger v{}", funding_ledger::VERSION);
    config.log_summary();

    let metrics_handle = if config.enable_metrics {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        match metrics::set_boxed_recorder(Box::new(recorder)) {
            Ok(()) => {
                info!("Prometheus metrics recorder initialized");
                Some(handle)
            }
            Err(err) => {
                warn!("Metrics recorder unavailable: {}", err);
                None
            }
        }
    } else {
        None
    };

    let server = ApiServer::new(config, metrics_handle);
    server.serve(shutdown_signal()).await?;

    info!("Funding Ledger shut down gracefully");
    Ok(())
}

fn report(
    path: &str,
    markets: Vec<String>,
    all: bool,
    timeframe: Option<Timeframe>,
    pretty: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read CSV file {path}"))?;

    let selection = if all {
        let document = FundingDocument::parse(&text)?;
        MarketSelection::new(document.markets())
    } else {
        MarketSelection::new(markets)
    };
    if selection.is_empty() {
        bail!("no markets selected; pass --market NAME or --all");
    }

    let mut report = FundingReport::build(Some(&text), &selection, Utc::now())?;
    if let Some(timeframe) = timeframe {
        report = report.with_timeframe(timeframe);
    }

    info!(
        path,
        rows = report.row_count(),
        markets = report.stats.len(),
        "report built"
    );

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let filter = || match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&logging.level),
    };

    // Logs go to stderr so `report` output stays clean JSON on stdout
    let stdout_layer = if logging.structured {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .with_filter(filter()?)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter()?)
            .boxed()
    };

    let (file_layer, guard) = if logging.log_to_file {
        let file_appender =
            tracing_appender::rolling::daily(&logging.log_directory, "funding-ledger.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter()?)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!("Failed to listen for shutdown signal: {:?}", err);
        }
    }
}
