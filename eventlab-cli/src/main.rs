//! EventLab CLI: run single backtests and parameter sweeps.
//!
//! Commands:
//! - `run`: execute one backtest from a TOML config file and save artifacts
//! - `sweep`: run a grid of moving-average windows over the same data

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use eventlab_core::analytics::UNDEFINED;
use eventlab_runner::export::summary_table;
use eventlab_runner::{
    run_single_backtest, save_artifacts, BacktestResult, ParamGrid, ParamSweep, RunConfig,
};

#[derive(Parser)]
#[command(name = "eventlab", about = "EventLab CLI: event-driven backtesting engine")]
struct Cli {
    /// Default log filter; `EVENTLAB_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the full result as JSON instead of the summary table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run a grid of moving-average windows in parallel.
    Sweep {
        /// Path to a TOML config file; its `[strategy]` section is ignored.
        #[arg(long)]
        config: PathBuf,

        /// Short windows, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = [10usize, 20, 50])]
        short: Vec<usize>,

        /// Long windows, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = [100usize, 150, 200])]
        long: Vec<usize>,

        /// Run one configuration at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Save artifacts for every run under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            json,
        } => run_backtest_cmd(config, output_dir, json),
        Commands::Sweep {
            config,
            short,
            long,
            sequential,
            output_dir,
        } => run_sweep_cmd(config, short, long, sequential, output_dir),
    }
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = std::env::var("EVENTLAB_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .with_context(|| format!("invalid log filter '{filter}'"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

fn run_backtest_cmd(config_path: PathBuf, output_dir: PathBuf, json: bool) -> Result<()> {
    let config = RunConfig::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let result = run_single_backtest(&config).context("backtest failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_sweep_cmd(
    config_path: PathBuf,
    short: Vec<usize>,
    long: Vec<usize>,
    sequential: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = RunConfig::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let grid = ParamGrid::new(short, long);
    if grid.size() == 0 {
        bail!("the grid has no valid (short < long) window pairs");
    }

    let results = ParamSweep::new()
        .with_parallelism(!sequential)
        .sweep(&grid, &config)
        .context("sweep failed")?;

    println!(
        "{:<20} {:>12} {:>10} {:>10} {:>8}",
        "Strategy", "Total Return", "Sharpe", "Max DD", "Fills"
    );
    println!("{}", "-".repeat(64));
    for r in results.all() {
        println!(
            "{:<20} {:>12} {:>10} {:>9.2}% {:>8}",
            r.strategy,
            r.summary
                .total_return
                .map_or_else(|| UNDEFINED.to_string(), |v| format!("{:.2}%", v * 100.0)),
            r.summary
                .sharpe
                .map_or_else(|| UNDEFINED.to_string(), |v| format!("{v:.3}")),
            r.summary.max_drawdown * 100.0,
            r.report.stats.fills,
        );
    }
    if let Some(best) = results.best() {
        println!();
        println!("Best by Sharpe: {}", best.strategy);
    }

    if let Some(dir) = output_dir {
        for r in results.all() {
            save_artifacts(r, &dir)?;
        }
        println!("Artifacts saved under: {}", dir.display());
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let stats = &result.report.stats;
    println!("Strategy: {}", result.strategy);
    println!("Symbols:  {}", result.config.data.symbols.join(", "));
    println!("Outcome:  {:?}", result.report.outcome);
    println!(
        "Bars: {}  Signals: {}  Orders: {}  Fills: {}  Rejected orders: {}",
        stats.bars, stats.signals, stats.orders, stats.fills, stats.rejected_orders
    );
    println!();
    print!("{}", summary_table(&result.summary));
}
