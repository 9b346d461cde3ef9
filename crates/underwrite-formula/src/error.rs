//! Formula error types

use thiserror::Error;
use underwrite_core::CellError;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Why a formula could not be parsed or evaluated
///
/// Never fatal to a grid: [`FormulaEngine`](crate::FormulaEngine) stores the
/// matching [`CellError`] in the cell and moves on.
#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("Cannot parse formula: {0}")]
    Parse(String),

    /// A reference outside the addressable sheet
    #[error("Bad cell reference {0}")]
    InvalidReference(String),

    /// Not in the function registry (`IRR` included)
    #[error("Function {0} is not available")]
    UnknownFunction(String),

    #[error("{function} takes {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        /// Accepted count with its noun, e.g. `1 to 2 arguments`
        expected: String,
        actual: usize,
    },

    #[error("Bad argument: {0}")]
    Argument(String),
}

impl FormulaError {
    /// Excel error value a cell shows for this failure
    pub fn cell_error(&self) -> CellError {
        match self {
            FormulaError::Parse(_) | FormulaError::UnknownFunction(_) => CellError::Name,
            FormulaError::InvalidReference(_) => CellError::Ref,
            FormulaError::ArgumentCount { .. } | FormulaError::Argument(_) => CellError::Value,
        }
    }
}
