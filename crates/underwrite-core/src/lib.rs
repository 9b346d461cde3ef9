//! # underwrite-core
//!
//! Core data structures for the underwrite proforma engine.
//!
//! This crate provides the fundamental types shared by the loader, the formula
//! engine and the metrics pipeline:
//! - [`CellAddress`] and [`CellRange`] - 1-based cell addressing and ranges
//! - [`CellContent`] and [`LiteralValue`] - raw cell content as stored in a workbook
//! - [`SheetSnapshot`] - the immutable, rectangular grid produced by the loader
//! - [`SharedFormulaMaster`] - the one literal formula behind a shared-formula group
//!
//! ## Example
//!
//! ```rust
//! use underwrite_core::{CellAddress, CellContent, LiteralValue, SheetSnapshot};
//!
//! let mut sheet = SheetSnapshot::new("Acquisition Model", 30, 15);
//! let b29 = CellAddress::parse("B29").unwrap();
//! sheet.set(b29, CellContent::Literal(LiteralValue::Number(5.0))).unwrap();
//!
//! assert_eq!(sheet.literal_number(b29), Some(5.0));
//! assert_eq!(b29.to_string(), "B29");
//! ```

pub mod cell;
pub mod error;
pub mod snapshot;

// Re-exports for convenience
pub use cell::{CellAddress, CellContent, CellError, CellRange, LiteralValue};
pub use error::{Error, Result};
pub use snapshot::{SharedFormulaMaster, SheetSnapshot};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
