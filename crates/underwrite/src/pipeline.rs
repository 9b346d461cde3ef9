//! The evaluation pipeline
//!
//! bytes → [`WorkbookLoader`] → [`FormulaEvaluationGrid`] (shared formulas
//! expanded, hold-period ranges made concrete, `IRR` masked) → [`IrrSolver`]
//! → [`MetricsExtractor`].

use serde::{Deserialize, Serialize};
use underwrite_core::{SheetSnapshot, MAX_COLS};
use underwrite_xlsx::WorkbookLoader;

use crate::catalog::MetricsCatalog;
use crate::config::EngineConfig;
use crate::diagnostics::EvaluationDiagnostics;
use crate::dynamic_range::DynamicRangeRewriter;
use crate::error::Result;
use crate::grid::{FormulaEvaluationGrid, ResolvedGrid};
use crate::irr::IrrSolver;
use crate::metrics::{FinancialMetrics, MetricsExtractor};

/// Result of evaluating one workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub metrics: FinancialMetrics,
    pub diagnostics: EvaluationDiagnostics,
}

/// Hold period from the catalog's hold-period cell, and whether `default` was used
///
/// The cell must hold a finite, non-negative number no wider than a sheet;
/// fractions are truncated. Text is never read as a number here, even
/// when it spells one.
pub fn hold_period(snapshot: &SheetSnapshot, catalog: &MetricsCatalog, default: u32) -> (u32, bool) {
    let cell = catalog.exit.hold_period_years;
    match snapshot.literal_number(cell) {
        Some(years) if years.is_finite() && (0.0..=f64::from(MAX_COLS)).contains(&years) => {
            (years as u32, false)
        }
        other => {
            log::warn!(
                "Hold period at {} is unusable ({:?}); assuming {} years",
                cell,
                other,
                default
            );
            (default, true)
        }
    }
}

fn rewriter_for(
    snapshot: &SheetSnapshot,
    config: &EngineConfig,
    diagnostics: &mut EvaluationDiagnostics,
) -> DynamicRangeRewriter {
    let catalog = &config.catalog;
    let (years, defaulted) = hold_period(snapshot, catalog, config.default_hold_period_years);
    diagnostics.hold_period_years = years;
    diagnostics.hold_period_defaulted = defaulted;
    DynamicRangeRewriter::new(catalog.exit.hold_period_years, years)
}

/// Evaluate a loaded snapshot
pub fn evaluate_snapshot(snapshot: &SheetSnapshot, config: &EngineConfig) -> Evaluation {
    let mut diagnostics = EvaluationDiagnostics::default();
    let rewriter = rewriter_for(snapshot, config, &mut diagnostics);

    let grid = FormulaEvaluationGrid::build(snapshot, &rewriter, &mut diagnostics);

    let extractor = MetricsExtractor::new(&config.catalog, rewriter.hold_period_years());
    let irr = extractor.solve_irr(&grid, &IrrSolver::new(config.irr));
    let metrics = extractor.extract(&grid, irr);
    grid.dispose();

    if diagnostics.degraded_cells() > 0 {
        log::warn!(
            "{} cells of '{}' degraded during evaluation",
            diagnostics.degraded_cells(),
            snapshot.name()
        );
    }

    Evaluation {
        metrics,
        diagnostics,
    }
}

/// Evaluate XLSX `bytes` and extract the metrics
///
/// Fails only when the workbook cannot be read or has no worksheets; cells
/// that cannot be evaluated leave their metrics `None`.
pub fn evaluate_workbook(bytes: &[u8], config: &EngineConfig) -> Result<Evaluation> {
    let snapshot = load(bytes, config)?;
    Ok(evaluate_snapshot(&snapshot, config))
}

/// [`evaluate_workbook`] with the default configuration, metrics only
pub fn evaluate_metrics(bytes: &[u8]) -> Result<FinancialMetrics> {
    Ok(evaluate_workbook(bytes, &EngineConfig::default())?.metrics)
}

/// Load and resolve `bytes` without evaluating
pub fn resolve_workbook(
    bytes: &[u8],
    config: &EngineConfig,
) -> Result<(ResolvedGrid, EvaluationDiagnostics)> {
    let snapshot = load(bytes, config)?;
    let mut diagnostics = EvaluationDiagnostics::default();
    let rewriter = rewriter_for(&snapshot, config, &mut diagnostics);
    let resolved = ResolvedGrid::resolve(&snapshot, &rewriter, &mut diagnostics);
    Ok((resolved, diagnostics))
}

fn load(bytes: &[u8], config: &EngineConfig) -> Result<SheetSnapshot> {
    Ok(WorkbookLoader::new()
        .with_min_columns(config.min_columns)
        .load(bytes)?)
}
