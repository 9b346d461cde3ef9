//! Parsed formula trees

use underwrite_core::{CellAddress, CellError, CellRange};

/// A parsed formula
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    CellRef(CellReference),
    RangeRef(RangeReference),
    /// A bare identifier; there are no defined names, so this is `#NAME?`
    NameRef(String),

    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },
    /// Upper-cased name, `_xlfn.` prefix removed
    Function { name: String, args: Vec<FormulaExpr> },
    /// An argument left out between commas, as in `PMT(r,n,pv,,1)`
    MissingArg,
}

impl FormulaExpr {
    /// Visit every reference this expression reads
    ///
    /// A single cell arrives as a one-cell range. Ranges are not expanded.
    pub fn for_each_reference(&self, f: &mut impl FnMut(CellRange)) {
        match self {
            FormulaExpr::CellRef(cell_ref) => f(CellRange::new(cell_ref.address, cell_ref.address)),
            FormulaExpr::RangeRef(range_ref) => f(range_ref.range),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.for_each_reference(f);
                right.for_each_reference(f);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.for_each_reference(f),
            FormulaExpr::Function { args, .. } => {
                args.iter().for_each(|arg| arg.for_each_reference(f));
            }
            FormulaExpr::Number(_)
            | FormulaExpr::String(_)
            | FormulaExpr::Boolean(_)
            | FormulaExpr::Error(_)
            | FormulaExpr::NameRef(_)
            | FormulaExpr::MissingArg => {}
        }
    }

    pub(crate) fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> Self {
        FormulaExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub(crate) fn unary(op: UnaryOperator, operand: FormulaExpr) -> Self {
        FormulaExpr::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }
}

/// A single cell, remembering which parts carried `$`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellReference {
    pub address: CellAddress,
    pub col_absolute: bool,
    pub row_absolute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeReference {
    pub range: CellRange,
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Concat,
}

impl BinaryOperator {
    /// Binding strength, Excel's order: comparison < `&` < `+ -` < `* /` < `^`
    ///
    /// All levels are left-associative, `^` included (`2^3^2` is 64).
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEqual => 1,
            BinaryOperator::Concat => 2,
            BinaryOperator::Add | BinaryOperator::Subtract => 3,
            BinaryOperator::Multiply | BinaryOperator::Divide => 4,
            BinaryOperator::Power => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    /// Postfix `%`
    Percent,
}
