//! Errors raised by addressing and snapshot construction

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Text that is not an A1 address
    #[error("'{0}' is not a cell address")]
    InvalidAddress(String),

    #[error("'{0}' is not a cell range")]
    InvalidRange(String),

    /// Row outside 1..=1048576
    #[error("row {0} is outside 1..={1}")]
    RowOutOfBounds(u32, u32),

    /// Column outside 1..=16384 (A..XFD)
    #[error("column {0} is outside 1..={1}")]
    ColumnOutOfBounds(u32, u32),

    #[error("{address} is beyond the {rows}x{cols} sheet")]
    OutsideGrid { address: String, rows: u32, cols: u32 },

    /// A shared-formula master must sit inside the range it declares
    #[error("shared formula master {master} is not inside its range {range}")]
    MasterOutsideRange { master: String, range: String },
}
