//! Tree-walking evaluation of parsed formulas against computed cell values

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::FormulaResult;
use crate::functions;
use crate::value::FormulaValue;
use std::collections::BTreeMap;
use underwrite_core::{CellAddress, CellError, CellRange};

/// Evaluate `expr`, reading references from `values`
///
/// Cells missing from `values` read as [`FormulaValue::Empty`]. Excel errors
/// (`#DIV/0!` and friends) come back as values; `Err` is reserved for
/// formulas that can never evaluate, like an unknown function.
pub fn evaluate(
    expr: &FormulaExpr,
    values: &BTreeMap<CellAddress, FormulaValue>,
) -> FormulaResult<FormulaValue> {
    Evaluator { values }.eval(expr)
}

struct Evaluator<'a> {
    values: &'a BTreeMap<CellAddress, FormulaValue>,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &FormulaExpr) -> FormulaResult<FormulaValue> {
        Ok(match expr {
            FormulaExpr::Number(n) => FormulaValue::Number(*n),
            FormulaExpr::String(s) => FormulaValue::String(s.clone()),
            FormulaExpr::Boolean(b) => FormulaValue::Boolean(*b),
            FormulaExpr::Error(e) => FormulaValue::Error(*e),
            FormulaExpr::CellRef(cell_ref) => self.cell(cell_ref.address),
            FormulaExpr::RangeRef(range_ref) => self.range(&range_ref.range),
            FormulaExpr::NameRef(_) => FormulaValue::Error(CellError::Name),
            FormulaExpr::BinaryOp { op, left, right } => {
                let left = self.scalar(left)?;
                let right = self.scalar(right)?;
                binary(*op, &left, &right)
            }
            FormulaExpr::UnaryOp { op, operand } => unary(*op, self.scalar(operand)?),
            FormulaExpr::Function { name, args } => return self.call(name, args),
            FormulaExpr::MissingArg => FormulaValue::Empty,
        })
    }

    /// An operand: a one-cell range is its cell, a wider range is `#VALUE!`
    fn scalar(&self, expr: &FormulaExpr) -> FormulaResult<FormulaValue> {
        match expr {
            FormulaExpr::RangeRef(range_ref) if range_ref.range.start == range_ref.range.end => {
                Ok(self.cell(range_ref.range.start))
            }
            FormulaExpr::RangeRef(_) => Ok(FormulaValue::Error(CellError::Value)),
            other => Ok(self.eval(other)?.into_scalar()),
        }
    }

    fn cell(&self, addr: CellAddress) -> FormulaValue {
        self.values.get(&addr).cloned().unwrap_or(FormulaValue::Empty)
    }

    /// The populated cells of `range`, one inner Vec per row that has any
    ///
    /// Blank cells are left out; no built-in counts them.
    fn range(&self, range: &CellRange) -> FormulaValue {
        let mut rows: Vec<Vec<FormulaValue>> = Vec::new();
        let mut current_row = None;
        for (addr, value) in range.occupied(self.values) {
            if current_row != Some(addr.row) {
                current_row = Some(addr.row);
                rows.push(Vec::new());
            }
            if let Some(row) = rows.last_mut() {
                row.push(value.clone());
            }
        }
        FormulaValue::Array(rows)
    }

    /// Arguments are all evaluated up front; IF does not short-circuit
    fn call(&self, name: &str, args: &[FormulaExpr]) -> FormulaResult<FormulaValue> {
        let function = functions::registry().lookup(name)?;
        function.check_arity(args.len())?;

        let values = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<FormulaResult<Vec<_>>>()?;
        (function.implementation)(&values)
    }
}

fn binary(op: BinaryOperator, left: &FormulaValue, right: &FormulaValue) -> FormulaValue {
    if let Some(e) = left.error().or_else(|| right.error()) {
        return FormulaValue::Error(e);
    }

    let ordering = || left.compare(right);
    match op {
        BinaryOperator::Add => arithmetic(left, right, |l, r| Ok(l + r)),
        BinaryOperator::Subtract => arithmetic(left, right, |l, r| Ok(l - r)),
        BinaryOperator::Multiply => arithmetic(left, right, |l, r| Ok(l * r)),
        BinaryOperator::Divide => arithmetic(left, right, |l, r| {
            if r == 0.0 {
                Err(CellError::Div0)
            } else {
                Ok(l / r)
            }
        }),
        BinaryOperator::Power => arithmetic(left, right, |l, r| Ok(l.powf(r))),
        BinaryOperator::Equal => FormulaValue::Boolean(ordering().is_eq()),
        BinaryOperator::NotEqual => FormulaValue::Boolean(ordering().is_ne()),
        BinaryOperator::LessThan => FormulaValue::Boolean(ordering().is_lt()),
        BinaryOperator::LessEqual => FormulaValue::Boolean(ordering().is_le()),
        BinaryOperator::GreaterThan => FormulaValue::Boolean(ordering().is_gt()),
        BinaryOperator::GreaterEqual => FormulaValue::Boolean(ordering().is_ge()),
        BinaryOperator::Concat => FormulaValue::String(left.text() + &right.text()),
    }
}

/// Non-numeric operands are `#VALUE!`, non-finite results `#NUM!`
fn arithmetic(
    left: &FormulaValue,
    right: &FormulaValue,
    f: impl Fn(f64, f64) -> Result<f64, CellError>,
) -> FormulaValue {
    let (Some(l), Some(r)) = (left.coerce_number(), right.coerce_number()) else {
        return FormulaValue::Error(CellError::Value);
    };
    match f(l, r) {
        Ok(n) if n.is_finite() => FormulaValue::Number(n),
        Ok(_) => FormulaValue::Error(CellError::Num),
        Err(e) => FormulaValue::Error(e),
    }
}

fn unary(op: UnaryOperator, operand: FormulaValue) -> FormulaValue {
    if let Some(e) = operand.error() {
        return FormulaValue::Error(e);
    }
    match (op, operand.coerce_number()) {
        (_, None) => FormulaValue::Error(CellError::Value),
        (UnaryOperator::Negate, Some(n)) => FormulaValue::Number(-n),
        (UnaryOperator::Percent, Some(n)) => FormulaValue::Number(n / 100.0),
    }
}

#[cfg(test)]
pub(crate) fn eval_str(formula: &str) -> FormulaResult<FormulaValue> {
    let ast = crate::parser::parse_formula(formula)?;
    evaluate(&ast, &BTreeMap::new())
}
