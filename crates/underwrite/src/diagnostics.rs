//! Counters of cells that degraded during an evaluation

use serde::{Deserialize, Serialize};
use underwrite_formula::EngineStats;

/// What an evaluation had to skip or assume
///
/// Every counted cell evaluated as empty (or as an error value) instead of
/// failing the whole workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDiagnostics {
    /// Hold period the ranges and cash-flow slices were built with
    pub hold_period_years: u32,
    /// The hold-period cell was missing or unusable and the default applied
    pub hold_period_defaulted: bool,
    /// Shared-formula members expanded from their master
    pub shared_formulas_resolved: usize,
    /// Shared-formula members whose group has no master
    pub dangling_shared_refs: usize,
    /// Formulas whose hold-period `OFFSET` ranges were made concrete
    pub dynamic_ranges_rewritten: usize,
    /// Formulas with a hold-period range that could not be made concrete
    pub unresolved_dynamic_ranges: usize,
    /// Formulas calling `IRR`, left empty for the external solver
    pub masked_irr_formulas: usize,
    /// Formulas the evaluator could not parse
    pub parse_errors: usize,
    /// Formulas whose evaluation failed (unknown function, wrong arity)
    pub evaluation_errors: usize,
    /// Formula cells on or fed by a circular chain
    pub circular_references: usize,
}

impl EvaluationDiagnostics {
    /// Fold in the calculation statistics of the evaluator
    pub fn record_engine(&mut self, stats: &EngineStats) {
        self.parse_errors = stats.parse_errors;
        self.evaluation_errors = stats.evaluation_errors;
        self.circular_references = stats.circular_references;
    }

    /// Number of cells that degraded
    pub fn degraded_cells(&self) -> usize {
        self.dangling_shared_refs
            + self.unresolved_dynamic_ranges
            + self.parse_errors
            + self.evaluation_errors
            + self.circular_references
    }
}
