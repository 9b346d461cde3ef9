//! Grid calculation engine
//!
//! Takes a grid of literals and formulas, builds the dependency graph,
//! and evaluates every formula after the cells it reads. Cells on a
//! circular chain evaluate to `#REF!`; formulas that fail to parse evaluate
//! to `#NAME?`.

use crate::ast::FormulaExpr;
use crate::dependency::DependencyGraph;
use crate::evaluator::evaluate;
use crate::parser::parse_formula;
use crate::value::FormulaValue;
use std::collections::BTreeMap;
use underwrite_core::{CellAddress, CellContent, CellError};

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Total number of formula cells handed to the engine
    pub formula_count: usize,
    /// Number of formulas evaluated
    pub cells_calculated: usize,
    /// Number of formula cells on (or fed by) a circular chain
    pub circular_references: usize,
    /// Number of formulas that could not be parsed
    pub parse_errors: usize,
    /// Number of formulas whose evaluation failed (unknown function, arity)
    pub evaluation_errors: usize,
}

/// A fully evaluated grid
///
/// Owns the value of every literal and formula cell, keyed row-major so
/// ranges read only the cells they cover. The dependency graph and parsed
/// formulas only live while [`FormulaEngine::build`] runs.
#[derive(Debug)]
pub struct FormulaEngine {
    values: BTreeMap<CellAddress, FormulaValue>,
    stats: EngineStats,
}

impl FormulaEngine {
    /// Evaluate a grid of cells
    ///
    /// Literal cells are taken as-is and formula cells are evaluated.
    /// Shared-formula references and empty cells carry no value.
    pub fn build<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (CellAddress, CellContent)>,
    {
        let mut values = BTreeMap::new();
        let mut stats = EngineStats::default();
        let mut parsed: BTreeMap<CellAddress, FormulaExpr> = BTreeMap::new();

        // Phase 1: literals and parsed formulas
        for (addr, content) in cells {
            match content {
                CellContent::Literal(value) => {
                    values.insert(addr, FormulaValue::from(value));
                }
                CellContent::Formula(text) => {
                    stats.formula_count += 1;
                    match parse_formula(&text) {
                        Ok(ast) => {
                            parsed.insert(addr, ast);
                        }
                        Err(e) => {
                            log::warn!("Failed to parse formula at {} ({}): {}", addr, text, e);
                            stats.parse_errors += 1;
                            values.insert(addr, FormulaValue::Error(CellError::Name));
                        }
                    }
                }
                CellContent::SharedRef(group) => {
                    log::debug!("Ignoring unresolved shared formula {} at {}", group, addr);
                }
                CellContent::Empty => {}
            }
        }

        // Phase 2: edges between formulas. Literals are ready from the start,
        // so a range only links to the formula cells it covers.
        let mut graph = DependencyGraph::new();
        for (&addr, ast) in &parsed {
            ast.for_each_reference(&mut |range| {
                for (precedent, _) in range.occupied(&parsed) {
                    graph.add_dependency(precedent, addr);
                }
            });
        }

        // Phase 3: order formulas, setting aside cycles
        let formula_cells: Vec<CellAddress> = parsed.keys().copied().collect();
        let plan = graph.plan(&formula_cells);
        stats.circular_references = plan.circular.len();
        if !plan.circular.is_empty() {
            log::warn!("{} formula cells involved in circular references", plan.circular.len());
        }
        for addr in plan.circular {
            values.insert(addr, FormulaValue::Error(CellError::Ref));
        }

        // Phase 4: evaluate in dependency order
        for addr in plan.order {
            let Some(ast) = parsed.get(&addr) else {
                continue;
            };
            let result = evaluate(ast, &values).unwrap_or_else(|e| {
                log::warn!("Evaluation error at {}: {}", addr, e);
                stats.evaluation_errors += 1;
                FormulaValue::Error(e.cell_error())
            });
            values.insert(addr, result);
            stats.cells_calculated += 1;
        }

        log::debug!(
            "Evaluated {} of {} formulas ({} circular, {} unparseable)",
            stats.cells_calculated,
            stats.formula_count,
            stats.circular_references,
            stats.parse_errors
        );

        Self { values, stats }
    }

    /// Value of a cell; `None` for cells that were never given content
    pub fn value_at(&self, addr: CellAddress) -> Option<&FormulaValue> {
        self.values.get(&addr)
    }

    /// Statistics from the calculation run
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Consume the engine, returning every computed value
    pub fn into_values(self) -> BTreeMap<CellAddress, FormulaValue> {
        self.values
    }
}
