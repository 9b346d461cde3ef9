//! Resolved and evaluated grids
//!
//! [`ResolvedGrid`] is the snapshot with every formula made literal and
//! concrete; [`FormulaEvaluationGrid`] is that grid run through the formula
//! engine.

use std::borrow::Cow;

use underwrite_core::{CellAddress, CellContent, LiteralValue, SheetSnapshot};
use underwrite_formula::{EngineStats, FormulaEngine, FormulaValue};

use crate::diagnostics::EvaluationDiagnostics;
use crate::dynamic_range::DynamicRangeRewriter;
use crate::shared::SharedFormulaResolver;
use crate::values::{literal_number, CellValues};

/// Literal and concrete-formula cells only
///
/// No shared-formula reference, hold-period `OFFSET` or `IRR` call remains.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGrid {
    cells: Vec<(CellAddress, CellContent)>,
}

impl ResolvedGrid {
    /// Expand shared formulas, make hold-period ranges concrete and mask `IRR`
    ///
    /// Cells that cannot be resolved are dropped (they read as empty) and
    /// counted in `diagnostics`.
    pub fn resolve(
        snapshot: &SheetSnapshot,
        rewriter: &DynamicRangeRewriter,
        diagnostics: &mut EvaluationDiagnostics,
    ) -> Self {
        let resolver = SharedFormulaResolver::new(snapshot);
        let mut cells = Vec::new();

        for (addr, content) in snapshot.iter() {
            let formula = match content {
                CellContent::Literal(value) => {
                    cells.push((addr, CellContent::Literal(value.clone())));
                    continue;
                }
                CellContent::Formula(text) => Cow::Borrowed(text.as_str()),
                CellContent::SharedRef(group) => match resolver.resolve(addr, *group) {
                    Some(text) => {
                        diagnostics.shared_formulas_resolved += 1;
                        Cow::Owned(text)
                    }
                    None => {
                        log::warn!(
                            "Shared formula group {} at {} has no master; cell left empty",
                            group,
                            addr
                        );
                        diagnostics.dangling_shared_refs += 1;
                        continue;
                    }
                },
                CellContent::Empty => continue,
            };

            if let Some(content) = concrete_formula(addr, &formula, rewriter, diagnostics) {
                cells.push((addr, content));
            }
        }

        log::debug!(
            "Resolved {} cells ({} shared, {} ranges rewritten, {} IRR masked)",
            cells.len(),
            diagnostics.shared_formulas_resolved,
            diagnostics.dynamic_ranges_rewritten,
            diagnostics.masked_irr_formulas
        );

        Self { cells }
    }

    /// All cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &CellContent)> + '_ {
        self.cells.iter().map(|(addr, content)| (*addr, content))
    }

    /// Formula cells with their text, in row-major order
    pub fn formulas(&self) -> impl Iterator<Item = (CellAddress, &str)> + '_ {
        self.cells
            .iter()
            .filter_map(|(addr, content)| content.formula_text().map(|text| (*addr, text)))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn calls_irr(formula: &str) -> bool {
    formula.to_ascii_uppercase().contains("IRR(")
}

fn concrete_formula(
    addr: CellAddress,
    formula: &str,
    rewriter: &DynamicRangeRewriter,
    diagnostics: &mut EvaluationDiagnostics,
) -> Option<CellContent> {
    if calls_irr(formula) {
        log::debug!("Masking IRR formula at {}: {}", addr, formula);
        diagnostics.masked_irr_formulas += 1;
        return None;
    }

    match rewriter.rewrite(formula) {
        Some(text) => {
            if text != formula {
                diagnostics.dynamic_ranges_rewritten += 1;
            }
            Some(CellContent::formula(text))
        }
        None => {
            log::warn!(
                "Cannot size hold-period range at {} (hold period {}): {}",
                addr,
                rewriter.hold_period_years(),
                formula
            );
            diagnostics.unresolved_dynamic_ranges += 1;
            None
        }
    }
}

/// An evaluated grid, queryable by address
#[derive(Debug)]
pub struct FormulaEvaluationGrid {
    engine: FormulaEngine,
}

impl FormulaEvaluationGrid {
    /// Resolve `snapshot` and evaluate it
    pub fn build(
        snapshot: &SheetSnapshot,
        rewriter: &DynamicRangeRewriter,
        diagnostics: &mut EvaluationDiagnostics,
    ) -> Self {
        let resolved = ResolvedGrid::resolve(snapshot, rewriter, diagnostics);
        let grid = Self::evaluate(resolved);
        diagnostics.record_engine(grid.stats());
        grid
    }

    /// Evaluate an already resolved grid
    pub fn evaluate(resolved: ResolvedGrid) -> Self {
        Self {
            engine: FormulaEngine::build(resolved.cells),
        }
    }

    /// Value of a cell as a number or text
    ///
    /// Empty, error and boolean cells are `None`.
    pub fn value_at(&self, addr: CellAddress) -> Option<LiteralValue> {
        self.engine.value_at(addr).and_then(to_literal)
    }

    pub fn stats(&self) -> &EngineStats {
        self.engine.stats()
    }

    /// Release the evaluator and everything it holds
    pub fn dispose(self) {
        log::debug!(
            "Releasing evaluator ({} formulas)",
            self.engine.stats().formula_count
        );
    }
}

impl CellValues for FormulaEvaluationGrid {
    /// Numbers, and text that reads as a number once `,` `$` `%` are removed
    fn number_at(&self, addr: CellAddress) -> Option<f64> {
        self.value_at(addr).as_ref().and_then(literal_number)
    }
}

fn to_literal(value: &FormulaValue) -> Option<LiteralValue> {
    match value {
        FormulaValue::Number(n) => Some(LiteralValue::Number(*n)),
        FormulaValue::String(s) => Some(LiteralValue::Text(s.clone())),
        // A formula that is just a one-cell range
        FormulaValue::Array(rows) => match rows.as_slice() {
            [row] => match row.as_slice() {
                [single] => to_literal(single),
                _ => None,
            },
            _ => None,
        },
        FormulaValue::Boolean(_) | FormulaValue::Error(_) | FormulaValue::Empty => None,
    }
}
