//! Built-in Excel functions
//!
//! The registry covers what the proforma template uses: aggregates, rounding,
//! logical tests and time-value-of-money. `IRR` is deliberately absent.

pub mod financial;
pub mod logical;
pub mod math;

use crate::error::{FormulaError, FormulaResult};
use crate::value::FormulaValue;
use ahash::AHashMap;
use std::sync::OnceLock;
use underwrite_core::CellError;

/// A built-in: receives its arguments already evaluated
pub type FunctionImpl = fn(&[FormulaValue]) -> FormulaResult<FormulaValue>;

pub struct FunctionDef {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions
    pub max_args: Option<usize>,
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// Reject a call with the wrong number of arguments
    pub fn check_arity(&self, count: usize) -> FormulaResult<()> {
        let too_many = self.max_args.is_some_and(|max| count > max);
        if count >= self.min_args && !too_many {
            return Ok(());
        }
        let noun = |n: usize| if n == 1 { "argument" } else { "arguments" };
        let expected = match self.max_args {
            Some(max) if max == self.min_args => format!("{} {}", max, noun(max)),
            Some(max) => format!("{} to {} {}", self.min_args, max, noun(max)),
            None => format!("at least {} {}", self.min_args, noun(self.min_args)),
        };
        Err(FormulaError::ArgumentCount {
            function: self.name.to_string(),
            expected,
            actual: count,
        })
    }
}

/// Name-to-function table, keys upper-cased
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

/// The shared built-in registry
pub fn registry() -> &'static FunctionRegistry {
    static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FunctionRegistry::builtin)
}

impl FunctionRegistry {
    fn builtin() -> Self {
        const TABLE: &[(&str, usize, Option<usize>, FunctionImpl)] = &[
            ("SUM", 1, None, math::fn_sum),
            ("AVERAGE", 1, None, math::fn_average),
            ("MIN", 1, None, math::fn_min),
            ("MAX", 1, None, math::fn_max),
            ("COUNT", 1, None, math::fn_count),
            ("ABS", 1, Some(1), math::fn_abs),
            ("ROUND", 1, Some(2), math::fn_round),
            ("ROUNDUP", 1, Some(2), math::fn_roundup),
            ("ROUNDDOWN", 1, Some(2), math::fn_rounddown),
            ("INT", 1, Some(1), math::fn_int),
            ("MOD", 2, Some(2), math::fn_mod),
            ("POWER", 2, Some(2), math::fn_power),
            ("SQRT", 1, Some(1), math::fn_sqrt),
            ("IF", 2, Some(3), logical::fn_if),
            ("AND", 1, None, logical::fn_and),
            ("OR", 1, None, logical::fn_or),
            ("NOT", 1, Some(1), logical::fn_not),
            ("IFERROR", 2, Some(2), logical::fn_iferror),
            ("PMT", 3, Some(5), financial::fn_pmt),
            ("IPMT", 4, Some(6), financial::fn_ipmt),
            ("PPMT", 4, Some(6), financial::fn_ppmt),
            ("PV", 3, Some(5), financial::fn_pv),
            ("FV", 3, Some(5), financial::fn_fv),
            ("NPV", 2, None, financial::fn_npv),
        ];

        let functions = TABLE
            .iter()
            .map(|&(name, min_args, max_args, implementation)| {
                let def = FunctionDef {
                    name,
                    min_args,
                    max_args,
                    implementation,
                };
                (name, def)
            })
            .collect();
        Self { functions }
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_ascii_uppercase().as_str())
    }

    pub fn lookup(&self, name: &str) -> FormulaResult<&FunctionDef> {
        self.get(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Scalar numeric argument at `idx`
///
/// Errors propagate, empty cells read as zero, a missing optional argument
/// is `None`. A single-cell range collapses to its value.
pub(crate) fn optional_number_arg(
    args: &[FormulaValue],
    idx: usize,
) -> Result<Option<f64>, CellError> {
    match args.get(idx) {
        None => Ok(None),
        Some(FormulaValue::Number(n)) => Ok(Some(*n)),
        Some(FormulaValue::Boolean(b)) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Some(FormulaValue::Empty) => Ok(Some(0.0)),
        Some(FormulaValue::Error(e)) => Err(*e),
        Some(FormulaValue::String(s)) => s.trim().parse().map(Some).map_err(|_| CellError::Value),
        Some(FormulaValue::Array(rows)) => match rows.as_slice() {
            [row] if row.len() == 1 => optional_number_arg(row, 0),
            _ => Err(CellError::Value),
        },
    }
}

/// Required scalar numeric argument at `idx`
pub(crate) fn number_arg(args: &[FormulaValue], idx: usize) -> Result<f64, CellError> {
    optional_number_arg(args, idx).map(|n| n.unwrap_or(0.0))
}

/// Every number in the arguments, including those inside ranges
///
/// Text, booleans and blanks are skipped; the first error wins.
pub(crate) fn collect_numbers(args: &[FormulaValue]) -> Result<Vec<f64>, CellError> {
    let mut numbers = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Number(n) => numbers.push(*n),
            FormulaValue::Error(e) => return Err(*e),
            FormulaValue::Array(rows) => {
                for cell in rows.iter().flatten() {
                    match cell {
                        FormulaValue::Number(n) => numbers.push(*n),
                        FormulaValue::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    Ok(numbers)
}

/// Turn a numeric computation into a cell value; non-finite results are #NUM!
pub(crate) fn number_result(result: Result<f64, CellError>) -> FormulaResult<FormulaValue> {
    Ok(match result {
        Ok(n) if n.is_finite() => FormulaValue::Number(n),
        Ok(_) => FormulaValue::Error(CellError::Num),
        Err(e) => FormulaValue::Error(e),
    })
}
