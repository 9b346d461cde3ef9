//! Workbook loading
//!
//! Only the first worksheet in workbook order is read. Its cells land in a
//! [`SheetSnapshot`]; shared formulas stay compressed.

use std::io::{Cursor, Read, Seek};

use underwrite_core::SheetSnapshot;

use crate::error::{XlsxError, XlsxResult};

mod package;
mod strings;
mod worksheet;

use package::Package;

/// Column floor applied to every loaded grid
pub const DEFAULT_MIN_COLUMNS: u32 = 15;

/// Loads the first worksheet of an XLSX workbook into a [`SheetSnapshot`]
///
/// The grid spans the highest row and widest column present, and is never
/// narrower than the column floor.
#[derive(Debug, Clone, Copy)]
pub struct WorkbookLoader {
    min_columns: u32,
}

impl Default for WorkbookLoader {
    fn default() -> Self {
        Self {
            min_columns: DEFAULT_MIN_COLUMNS,
        }
    }
}

impl WorkbookLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_columns(mut self, min_columns: u32) -> Self {
        self.min_columns = min_columns;
        self
    }

    /// Load a workbook held in memory
    pub fn load(&self, bytes: &[u8]) -> XlsxResult<SheetSnapshot> {
        self.read(Cursor::new(bytes))
    }

    pub fn read<R: Read + Seek>(&self, reader: R) -> XlsxResult<SheetSnapshot> {
        let mut package = Package::open(reader)?;
        let strings = package.shared_strings()?;

        let sheet = package
            .sheets()?
            .into_iter()
            .next()
            .ok_or(XlsxError::NoWorksheets)?;
        let parsed = worksheet::read_worksheet(package.part(&sheet.path)?, &strings)?;
        let snapshot = parsed.into_snapshot(sheet.name, self.min_columns)?;

        let (rows, cols) = snapshot.dimensions();
        log::debug!(
            "Loaded sheet '{}' ({}x{}, {} cells, {} shared formula groups, {} shared strings)",
            snapshot.name(),
            rows,
            cols,
            snapshot.len(),
            snapshot.shared_masters().len(),
            strings.len()
        );
        Ok(snapshot)
    }
}
