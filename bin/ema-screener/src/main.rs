use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{print_summary, read_universe, write_debug_csv, write_results_csv, BatchRunner, YahooClient};

/// Screen a stock universe for pullbacks to a rising EMA.
///
/// Every option can also be set through the environment or a `.env` file.
#[derive(Debug, Parser)]
#[command(name = "ema-screener", version)]
struct Cli {
    /// Universe CSV (overrides UNIVERSE_PATH).
    #[arg(short, long)]
    universe: Option<PathBuf>,

    /// Pass-only results CSV (overrides OUTPUT_PATH).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the per-instrument debug table (overrides DEBUG).
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!("Screener aborted: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // ── Config ────────────────────────────────────────────────────────────────
    let mut cfg = Config::from_env().context("loading configuration")?;
    if let Some(path) = cli.universe {
        cfg.universe_path = path;
    }
    if let Some(path) = cli.output {
        cfg.output_path = path;
    }
    cfg.debug |= cli.debug;
    info!(
        universe = %cfg.universe_path.display(),
        ema_period = cfg.screener.ema_period,
        lookback_days = cfg.screener.lookback_days,
        debug = cfg.debug,
        "EMA screener starting"
    );

    // ── Universe ──────────────────────────────────────────────────────────────
    let universe = read_universe(&cfg.universe_path, &cfg.symbol_suffix)
        .with_context(|| format!("reading universe '{}'", cfg.universe_path.display()))?;

    // ── Screen ────────────────────────────────────────────────────────────────
    let provider = Arc::new(YahooClient::new(cfg.yahoo_base_url.as_str())?);
    let report = BatchRunner::new(provider, &cfg).run(&universe).await;

    // ── Outputs ───────────────────────────────────────────────────────────────
    let today = chrono::Local::now().date_naive();
    write_results_csv(&cfg.output_path, &report.ranked, today)
        .with_context(|| format!("writing '{}'", cfg.output_path.display()))?;
    if cfg.debug {
        write_debug_csv(&cfg.debug_output_path, &report.results, today)
            .with_context(|| format!("writing '{}'", cfg.debug_output_path.display()))?;
    }

    print_summary(&report.statistics, &report.ranked, cfg.preview_rows);
    Ok(())
}
