//! Values flowing through formula evaluation

use std::cmp::Ordering;
use underwrite_core::{CellError, LiteralValue};

/// The result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    /// Populated cells of a range reference, outer Vec is rows; blanks are
    /// left out
    Array(Vec<Vec<FormulaValue>>),
    /// A cell with no content
    Empty,
}

impl FormulaValue {
    /// Numeric reading used by operators: blanks are 0, booleans 0/1,
    /// numeric text parses, anything else has no number
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(b) => Some(f64::from(u8::from(*b))),
            FormulaValue::Empty => Some(0.0),
            FormulaValue::String(s) => s.trim().parse().ok(),
            FormulaValue::Error(_) | FormulaValue::Array(_) => None,
        }
    }

    /// Truth value for IF/NOT; text other than TRUE/FALSE has none
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::Empty => Some(false),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Text used by `&`
    pub fn text(&self) -> String {
        match self {
            FormulaValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            FormulaValue::Number(n) => n.to_string(),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Array(_) => CellError::Value.to_string(),
            FormulaValue::Empty => String::new(),
        }
    }

    pub fn error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// An array used where one value is expected: a lone value is itself,
    /// anything larger is `#VALUE!`
    pub fn into_scalar(self) -> FormulaValue {
        match self {
            FormulaValue::Array(rows) => {
                let mut cells = rows.into_iter().flatten();
                match (cells.next(), cells.next()) {
                    (Some(only), None) => only,
                    (None, _) => FormulaValue::Empty,
                    _ => FormulaValue::Error(CellError::Value),
                }
            }
            other => other,
        }
    }

    /// Excel ordering for comparison operators
    ///
    /// Numbers sort before text, text before booleans. Text compares without
    /// case. A blank takes the type of the other side (0, "" or FALSE).
    pub fn compare(&self, other: &FormulaValue) -> Ordering {
        match (self.blank_as(other), other.blank_as(self)) {
            (FormulaValue::Number(l), FormulaValue::Number(r)) => {
                l.partial_cmp(&r).unwrap_or(Ordering::Equal)
            }
            (FormulaValue::String(l), FormulaValue::String(r)) => {
                l.to_lowercase().cmp(&r.to_lowercase())
            }
            (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(&r),
            (l, r) => l.type_rank().cmp(&r.type_rank()),
        }
    }

    fn blank_as(&self, other: &FormulaValue) -> FormulaValue {
        match (self, other) {
            (FormulaValue::Empty, FormulaValue::String(_)) => FormulaValue::String(String::new()),
            (FormulaValue::Empty, FormulaValue::Boolean(_)) => FormulaValue::Boolean(false),
            (FormulaValue::Empty, _) => FormulaValue::Number(0.0),
            (value, _) => value.clone(),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            FormulaValue::Number(_) | FormulaValue::Empty => 0,
            FormulaValue::String(_) => 1,
            FormulaValue::Boolean(_) => 2,
            FormulaValue::Error(_) | FormulaValue::Array(_) => 3,
        }
    }
}

impl From<LiteralValue> for FormulaValue {
    fn from(value: LiteralValue) -> Self {
        match value {
            LiteralValue::Number(n) => FormulaValue::Number(n),
            LiteralValue::Text(s) => FormulaValue::String(s),
            LiteralValue::Boolean(b) => FormulaValue::Boolean(b),
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}
