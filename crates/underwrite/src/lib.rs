//! # underwrite
//!
//! Evaluates populated real-estate proforma workbooks and extracts the
//! investment metrics a template reports.
//!
//! The template leans on three things a plain formula evaluator cannot take
//! directly: shared-formula compression, `OFFSET` ranges whose width is the
//! hold period, and `IRR`. This crate
//!
//! - expands shared formulas into literal per-cell text ([`SharedFormulaResolver`]),
//! - rewrites hold-period `OFFSET` ranges into concrete ranges ([`DynamicRangeRewriter`]),
//! - evaluates the result with [`underwrite_formula::FormulaEngine`] ([`FormulaEvaluationGrid`]),
//! - solves IRR from the evaluated cash-flow rows ([`IrrSolver`]),
//! - reads everything else off a [`MetricsCatalog`] ([`MetricsExtractor`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use underwrite::{evaluate_workbook, EngineConfig};
//!
//! let bytes = std::fs::read("proforma.xlsx")?;
//! let evaluation = evaluate_workbook(&bytes, &EngineConfig::default())?;
//!
//! println!("{}", evaluation.metrics);
//! if evaluation.diagnostics.degraded_cells() > 0 {
//!     eprintln!("{:?}", evaluation.diagnostics);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cached;
pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod dynamic_range;
pub mod error;
pub mod grid;
pub mod irr;
pub mod metrics;
pub mod pipeline;
pub mod shared;
pub mod summary;
pub mod values;

pub use cached::{cached_metrics, read_cached_metrics, CachedValues};
pub use catalog::{MetricsCatalog, LOOPMAGIC_VERSION};
pub use config::{EngineConfig, DEFAULT_HOLD_PERIOD_YEARS};
pub use diagnostics::EvaluationDiagnostics;
pub use dynamic_range::DynamicRangeRewriter;
pub use error::{Error, Result};
pub use grid::{FormulaEvaluationGrid, ResolvedGrid};
pub use irr::{irr, IrrConfig, IrrSolver};
pub use metrics::{FinancialMetrics, MetricsExtractor, ReturnPair};
pub use pipeline::{
    evaluate_metrics, evaluate_snapshot, evaluate_workbook, hold_period, resolve_workbook,
    Evaluation,
};
pub use shared::{shift_formula_columns, SharedFormulaResolver};
pub use values::CellValues;

pub use underwrite_core::{CellAddress, SheetSnapshot};
