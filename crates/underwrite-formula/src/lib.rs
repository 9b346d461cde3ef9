//! # underwrite-formula
//!
//! Formula parser and evaluator for the underwrite proforma engine.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST → value)
//! - Built-in arithmetic, aggregate, logical and time-value-of-money functions
//! - Dependency tracking and [`FormulaEngine`], which evaluates a whole grid
//!   of literals and formulas in dependency order
//!
//! `IRR` is deliberately not a built-in; rate-of-return solving happens
//! outside the grid.
//!
//! ## Example
//!
//! ```rust
//! use underwrite_core::{CellAddress, CellContent};
//! use underwrite_formula::{FormulaEngine, FormulaValue};
//!
//! let b11 = CellAddress::parse("B11").unwrap();
//! let f23 = CellAddress::parse("F23").unwrap();
//! let b14 = CellAddress::parse("B14").unwrap();
//!
//! let engine = FormulaEngine::build(vec![
//!     (b11, CellContent::from(8_000_000.0)),
//!     (f23, CellContent::from(440_000.0)),
//!     (b14, CellContent::formula("=F23/B11")),
//! ]);
//!
//! assert_eq!(engine.value_at(b14), Some(&FormulaValue::Number(0.055)));
//! ```

pub mod ast;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod value;

pub use ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
pub use engine::{EngineStats, FormulaEngine};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::evaluate;
pub use parser::parse_formula;
pub use value::FormulaValue;
