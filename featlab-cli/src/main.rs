//! FeatLab CLI — batch preprocessing and inspection commands.
//!
//! Commands:
//! - `preprocess` — compute WMA lag features for every symbol in the catalog
//! - `inspect` — show the feature columns, or the features of one symbol
//! - `config init` — print or write a default configuration file
//!
//! Exit status: 0 when at least one symbol succeeded (or the catalog is
//! empty), 1 when every symbol failed, 2 when the configuration or the symbol
//! catalog could not be used.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use featlab_core::data::{OutputFormat, TimeSeriesRepository};
use featlab_core::domain::{min_history, FeatureRow};
use featlab_runner::{run_batch, save_report, BatchError, LogProgress, PipelineConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "featlab",
    about = "FeatLab CLI — weighted moving average lag features for daily price series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the config file (or the defaults).
#[derive(clap::Args)]
struct Overrides {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbol catalog CSV.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory holding raw `{SYMBOL}.csv` series.
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// WMA window length.
    #[arg(long)]
    period: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute features for every catalog symbol and write `{SYMBOL}_preprocessed` files.
    Preprocess {
        #[command(flatten)]
        overrides: Overrides,

        /// Output directory for feature files.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output format: csv or parquet.
        #[arg(long, value_parser = parse_format)]
        format: Option<OutputFormat>,

        /// Process symbols one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Worker threads (0 = all cores).
        #[arg(long)]
        threads: Option<usize>,

        /// Write the batch report here (.json or .csv).
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Show the feature columns, or compute and print one symbol's features.
    Inspect {
        /// Symbol to compute. Without it only the column layout is printed.
        symbol: Option<String>,

        #[command(flatten)]
        overrides: Overrides,

        /// Number of trailing rows to print.
        #[arg(long, default_value_t = 5)]
        tail: usize,
    },
    /// Configuration file helpers.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the default configuration, or write it to a file.
    Init {
        /// Destination file. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_ascii_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "parquet" => Ok(OutputFormat::Parquet),
        other => Err(format!("unknown format '{other}' (expected csv or parquet)")),
    }
}

/// Log filter from `RUST_LOG` directives, falling back to `info`.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess {
            overrides,
            output_dir,
            format,
            sequential,
            threads,
            report,
        } => run_preprocess(overrides, output_dir, format, sequential, threads, report),
        Commands::Inspect {
            symbol,
            overrides,
            tail,
        } => run_inspect(symbol, overrides, tail),
        Commands::Config { action } => match action {
            ConfigAction::Init { output, force } => run_config_init(output, force),
        },
    }
}

/// Load the config file (if any) and apply command-line overrides.
fn resolve_config(overrides: &Overrides) -> Result<PipelineConfig, BatchError> {
    let mut config = match &overrides.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(catalog) = &overrides.catalog {
        config.catalog.path = catalog.clone();
    }
    if let Some(raw_dir) = &overrides.raw_dir {
        config.data.raw_dir = raw_dir.clone();
    }
    if let Some(period) = overrides.period {
        config.features.period = period;
    }
    config.validate()?;
    Ok(config)
}

fn exit_fatal(err: &BatchError) -> ! {
    tracing::error!("{err}");
    eprintln!("Error: {err}");
    std::process::exit(2);
}

fn run_preprocess(
    overrides: Overrides,
    output_dir: Option<PathBuf>,
    format: Option<OutputFormat>,
    sequential: bool,
    threads: Option<usize>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = resolve_config(&overrides).unwrap_or_else(|e| exit_fatal(&e));
    if let Some(dir) = output_dir {
        config.data.output_dir = dir;
    }
    if let Some(format) = format {
        config.data.format = format;
    }
    if sequential {
        config.batch.parallel = false;
    }
    if let Some(threads) = threads {
        config.batch.threads = threads;
    }

    let report = run_batch(&config, &LogProgress).unwrap_or_else(|e| exit_fatal(&e));

    for line in report.summary_lines() {
        println!("{line}");
    }
    println!(
        "{} of {} symbols processed, {} rows written to {}",
        report.succeeded(),
        report.total(),
        report.total_rows(),
        config.data.output_dir.display()
    );

    if let Some(path) = report_path {
        save_report(&report, &path)?;
        println!("Report saved to: {}", path.display());
    }

    let code = report.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn run_inspect(symbol: Option<String>, overrides: Overrides, tail: usize) -> Result<()> {
    let config = resolve_config(&overrides).unwrap_or_else(|e| exit_fatal(&e));
    let period = config.features.period;

    let Some(symbol) = symbol else {
        println!("period:      {period}");
        println!("min history: {} bars", min_history(period));
        println!("columns:");
        for name in FeatureRow::column_names(period) {
            println!("  {name}");
        }
        return Ok(());
    };

    let pipeline = config.build_pipeline()?;
    let repo = config.build_repository();
    let bars = repo
        .load_bars(&symbol)
        .with_context(|| format!("failed to load {symbol}"))?;
    let set = pipeline.run(&bars);

    println!("symbol:      {symbol}");
    println!("bars:        {}", bars.len());
    println!("rows:        {} (need {} bars for the first)", set.len(), min_history(period));
    println!("fingerprint: {}", set.fingerprint());
    if set.is_empty() {
        return Ok(());
    }

    let start = set.len().saturating_sub(tail);
    let columns = set.column_names();
    for row in &set.rows[start..] {
        let mut obj = serde_json::Map::new();
        obj.insert(columns[0].clone(), row.date.to_string().into());
        for (name, value) in columns[1..].iter().zip(row.values()) {
            obj.insert(name.clone(), value.into());
        }
        println!("{}", serde_json::Value::Object(obj));
    }
    Ok(())
}

fn run_config_init(output: Option<PathBuf>, force: bool) -> Result<()> {
    let text = PipelineConfig::default().to_toml()?;

    let Some(path) = output else {
        print!("{text}");
        return Ok(());
    };

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(&path, text)
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    println!("Config written to: {}", path.display());
    Ok(())
}
