//! # underwrite-xlsx
//!
//! Loads the first worksheet of an XLSX (Office Open XML) workbook into a
//! [`SheetSnapshot`](underwrite_core::SheetSnapshot).
//!
//! Shared formulas are kept compressed: the master cell carries the formula
//! text and registers a [`SharedFormulaMaster`](underwrite_core::SharedFormulaMaster),
//! member cells carry only the group id. Expanding them is left to the caller.

pub mod error;
pub mod reader;

pub use error::{XlsxError, XlsxResult};
pub use reader::{WorkbookLoader, DEFAULT_MIN_COLUMNS};
