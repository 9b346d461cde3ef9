//! Workbook loading errors

use thiserror::Error;

pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// A workbook that cannot be loaded at all
///
/// Problems inside individual cells are not errors here; they surface later
/// as degraded cells.
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("cannot read workbook bytes: {0}")]
    Io(#[from] std::io::Error),

    /// Not a zip archive, or a corrupt one
    #[error("workbook is not a readable zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed workbook XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Zip opened but it is not a spreadsheet package
    #[error("not an xlsx package: {0}")]
    InvalidFormat(String),

    /// A part the package refers to is absent
    #[error("workbook part {0} is missing")]
    MissingPart(String),

    #[error("workbook has no worksheets")]
    NoWorksheets,

    /// Attribute or cell data that cannot be decoded
    #[error("bad worksheet data: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] underwrite_core::Error),
}
