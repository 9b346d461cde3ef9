//! Raw cell content as read from a workbook

use std::fmt;

/// A literal (non-formula) cell value
///
/// Serial dates are stored as [`LiteralValue::Number`] after conversion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum LiteralValue {
    /// Numeric value (all numbers are f64, like Excel)
    Number(f64),
    /// Text value
    Text(String),
    /// Boolean value
    Boolean(bool),
}

impl LiteralValue {
    /// Numeric view of the value, if it is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LiteralValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view of the value, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LiteralValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Number(n) => write!(f, "{}", n),
            LiteralValue::Text(s) => write!(f, "{}", s),
            LiteralValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Number(n)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::Text(s.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::Text(s)
    }
}

/// Content of a single cell in a [`SheetSnapshot`](crate::SheetSnapshot)
///
/// Exactly one variant per cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellContent {
    /// Empty cell (also used for error literals)
    #[default]
    Empty,
    /// Literal value
    Literal(LiteralValue),
    /// Formula text, without the leading `=`
    Formula(String),
    /// Member of a shared-formula group, identified by the group's `si` id
    SharedRef(u32),
}

impl CellContent {
    /// Create a formula cell, stripping a leading `=` if present
    pub fn formula<S: AsRef<str>>(text: S) -> Self {
        let text = text.as_ref();
        CellContent::Formula(text.strip_prefix('=').unwrap_or(text).to_string())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    /// Formula text if this cell holds a literal formula
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellContent::Formula(text) => Some(text),
            _ => None,
        }
    }

    /// Literal value if this cell holds one
    pub fn literal(&self) -> Option<&LiteralValue> {
        match self {
            CellContent::Literal(value) => Some(value),
            _ => None,
        }
    }
}

impl From<LiteralValue> for CellContent {
    fn from(value: LiteralValue) -> Self {
        CellContent::Literal(value)
    }
}

impl From<f64> for CellContent {
    fn from(n: f64) -> Self {
        CellContent::Literal(LiteralValue::Number(n))
    }
}
