//! Underwrite CLI - proforma workbook evaluation tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use underwrite::{
    evaluate_workbook, read_cached_metrics, resolve_workbook, EngineConfig, FinancialMetrics,
    MetricsCatalog,
};

#[derive(Parser)]
#[command(name = "underwrite")]
#[command(
    author,
    version,
    about = "Evaluate real-estate proforma workbooks and report investment metrics"
)]
struct Cli {
    /// Log pipeline progress and degraded cells to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a workbook and print its metrics
    Metrics {
        /// Input workbook (xlsx)
        input: PathBuf,

        /// Metrics catalog JSON (default: built-in loopmagic-2)
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        format: Format,

        /// Read the results cached in the file instead of recalculating
        #[arg(long)]
        cached: bool,
    },

    /// Print every formula after shared-formula and range resolution
    Resolve {
        /// Input workbook (xlsx)
        input: PathBuf,

        /// Metrics catalog JSON (default: built-in loopmagic-2)
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Summary,
}

/// Plain stderr logger for `--verbose`
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        log::set_logger(&LOGGER).map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
        log::set_max_level(log::LevelFilter::Debug);
    }

    match cli.command {
        Commands::Metrics {
            input,
            catalog,
            format,
            cached,
        } => metrics(&input, catalog.as_deref(), format, cached),
        Commands::Resolve { input, catalog } => resolve(&input, catalog.as_deref()),
    }
}

fn load_config(catalog: Option<&Path>) -> Result<EngineConfig> {
    let config = EngineConfig::default();
    let Some(path) = catalog else {
        return Ok(config);
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog '{}'", path.display()))?;
    let catalog = MetricsCatalog::from_json(&json)
        .with_context(|| format!("Invalid catalog '{}'", path.display()))?;
    Ok(config.with_catalog(catalog))
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
    std::fs::read(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn metrics(input: &Path, catalog: Option<&Path>, format: Format, cached: bool) -> Result<()> {
    let config = load_config(catalog)?;
    let bytes = read_input(input)?;

    let metrics: FinancialMetrics = if cached {
        read_cached_metrics(&bytes, &config.catalog)
            .with_context(|| format!("Failed to read '{}'", input.display()))?
    } else {
        let evaluation = evaluate_workbook(&bytes, &config)
            .with_context(|| format!("Failed to evaluate '{}'", input.display()))?;

        let degraded = evaluation.diagnostics.degraded_cells();
        if degraded > 0 {
            eprintln!("Warning: {} cells could not be evaluated", degraded);
        }
        if evaluation.diagnostics.hold_period_defaulted {
            eprintln!(
                "Warning: hold period missing, assumed {} years",
                evaluation.diagnostics.hold_period_years
            );
        }
        evaluation.metrics
    };

    let mut stdout = io::stdout().lock();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut stdout, &metrics)
                .context("Failed to serialize metrics")?;
            writeln!(stdout)?;
        }
        Format::Summary => writeln!(stdout, "{}", metrics)?,
    }

    Ok(())
}

fn resolve(input: &Path, catalog: Option<&Path>) -> Result<()> {
    let config = load_config(catalog)?;
    let bytes = read_input(input)?;

    let (grid, diagnostics) = resolve_workbook(&bytes, &config)
        .with_context(|| format!("Failed to resolve '{}'", input.display()))?;

    let mut stdout = io::stdout().lock();
    for (addr, formula) in grid.formulas() {
        writeln!(stdout, "{}\t={}", addr, formula).context("Failed to write to stdout")?;
    }

    eprintln!(
        "Resolved {} cells ({} shared formulas, {} ranges, {} IRR masked, {} dangling)",
        grid.len(),
        diagnostics.shared_formulas_resolved,
        diagnostics.dynamic_ranges_rewritten,
        diagnostics.masked_irr_formulas,
        diagnostics.dangling_shared_refs
    );

    Ok(())
}
