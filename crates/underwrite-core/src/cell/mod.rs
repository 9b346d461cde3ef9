//! Cell-related types

mod address;
mod content;
mod error;

pub use address::{CellAddress, CellRange};
pub use content::{CellContent, LiteralValue};
pub use error::CellError;
