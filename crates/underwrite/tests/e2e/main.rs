//! End-to-end tests for underwrite.
//!
//! Each test builds the workbook it needs in memory with `zip::ZipWriter`,
//! then runs it through the public pipeline.

mod cached;
mod common;
mod evaluation;

pub use common::*;
